//! In-memory adapters for the matching service ports.

use std::{
	collections::{BTreeMap, HashMap, HashSet, VecDeque},
	sync::{Mutex, MutexGuard},
	time::Duration,
};

use time::OffsetDateTime;
use uuid::Uuid;

use matching_domain::{
	Candidate, Category, NewProfile, NotificationRequest, Profile, ProfileRecord, ProfileStatus,
	QueryProjection, SignalLookup, matching,
};
use matching_notify::SinkError;
use matching_service::{BoxFuture, MemberSignals, NotificationSink, ProfileStore, RetryQueue};
use matching_storage::retry_queue::QueueStats;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

fn record_of(profile: &Profile) -> ProfileRecord {
	ProfileRecord {
		matching_id: profile.matching_id(),
		member_id: profile.member_id(),
		category: profile.category(),
		most_active_time: profile.most_active_time(),
		level: profile.level(),
		age: profile.age(),
		is_attending: profile.is_attending(),
		introduction: profile.introduction().to_string(),
		status: profile.status(),
		version: profile.version(),
		created_at: profile.created_at(),
		updated_at: profile.updated_at(),
	}
}

#[derive(Debug)]
struct StoreState {
	next_id: i64,
	profiles: BTreeMap<i64, Profile>,
}

/// Profile table kept in a map, with the same limit and version rules as Postgres.
#[derive(Debug)]
pub struct MemoryProfileStore {
	state: Mutex<StoreState>,
}
impl MemoryProfileStore {
	pub fn new() -> Self {
		Self { state: Mutex::new(StoreState { next_id: 1, profiles: BTreeMap::new() }) }
	}

	/// Stores `record` as is, bypassing the limit. The matching id is taken from the record.
	pub fn seed(&self, record: ProfileRecord) -> matching_storage::Result<Profile> {
		let profile = Profile::restore(record)?;
		let mut state = lock(&self.state);

		state.next_id = state.next_id.max(profile.matching_id() + 1);
		state.profiles.insert(profile.matching_id(), profile.clone());

		Ok(profile)
	}

	pub fn get(&self, matching_id: i64) -> Option<Profile> {
		lock(&self.state).profiles.get(&matching_id).cloned()
	}

	pub fn len(&self) -> usize {
		lock(&self.state).profiles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn insert_now(
		&self,
		profile: &NewProfile,
		limit: u32,
		now: OffsetDateTime,
	) -> matching_storage::Result<Profile> {
		let mut state = lock(&self.state);
		let active = state
			.profiles
			.values()
			.filter(|stored| {
				stored.is_active()
					&& stored.member_id() == profile.member_id()
					&& stored.category() == profile.category()
			})
			.count();

		if active >= limit as usize {
			return Err(matching_storage::Error::LimitExceeded {
				member_id: profile.member_id(),
				category: profile.category().as_str().to_string(),
				limit,
			});
		}

		let matching_id = state.next_id;
		let saved = Profile::restore(ProfileRecord {
			matching_id,
			member_id: profile.member_id(),
			category: profile.category(),
			most_active_time: profile.most_active_time(),
			level: profile.level(),
			age: profile.age(),
			is_attending: profile.is_attending(),
			introduction: profile.introduction().to_string(),
			status: ProfileStatus::Active,
			version: 0,
			created_at: now,
			updated_at: now,
		})?;

		state.next_id += 1;
		state.profiles.insert(matching_id, saved.clone());

		Ok(saved)
	}

	fn update_now(&self, profile: &Profile, now: OffsetDateTime) -> matching_storage::Result<Profile> {
		let mut state = lock(&self.state);
		let conflict = matching_storage::Error::VersionConflict {
			matching_id: profile.matching_id(),
			expected: profile.version(),
		};
		let Some(stored) = state.profiles.get(&profile.matching_id()) else {
			return Err(conflict);
		};

		if stored.version() != profile.version() {
			return Err(conflict);
		}

		let mut record = record_of(profile);

		record.version += 1;
		record.updated_at = now;

		let saved = Profile::restore(record)?;

		state.profiles.insert(saved.matching_id(), saved.clone());

		Ok(saved)
	}

	fn list(&self, filter: impl Fn(&Profile) -> bool) -> Vec<Profile> {
		lock(&self.state).profiles.values().filter(|profile| filter(profile)).cloned().collect()
	}
}
impl Default for MemoryProfileStore {
	fn default() -> Self {
		Self::new()
	}
}
impl ProfileStore for MemoryProfileStore {
	fn insert<'a>(
		&'a self,
		profile: &'a NewProfile,
		limit: u32,
		now: OffsetDateTime,
	) -> BoxFuture<'a, matching_storage::Result<Profile>> {
		let result = self.insert_now(profile, limit, now);

		Box::pin(async move { result })
	}

	fn update<'a>(
		&'a self,
		profile: &'a Profile,
		now: OffsetDateTime,
	) -> BoxFuture<'a, matching_storage::Result<Profile>> {
		let result = self.update_now(profile, now);

		Box::pin(async move { result })
	}

	fn find(&self, matching_id: i64) -> BoxFuture<'_, matching_storage::Result<Option<Profile>>> {
		let found = self.get(matching_id);

		Box::pin(async move { Ok(found) })
	}

	fn list_by_category_and_member(
		&self,
		category: Category,
		member_id: i64,
	) -> BoxFuture<'_, matching_storage::Result<Vec<Profile>>> {
		let mut profiles = self.list(|profile| {
			profile.category() == category && profile.member_id() == member_id
		});

		profiles.sort_by_key(|profile| std::cmp::Reverse(profile.matching_id()));

		Box::pin(async move { Ok(profiles) })
	}

	fn list_by_member(&self, member_id: i64) -> BoxFuture<'_, matching_storage::Result<Vec<Profile>>> {
		let mut profiles = self.list(|profile| profile.member_id() == member_id);

		profiles.sort_by_key(|profile| std::cmp::Reverse(profile.matching_id()));

		Box::pin(async move { Ok(profiles) })
	}

	fn find_candidates<'a>(
		&'a self,
		reference: &'a QueryProjection,
	) -> BoxFuture<'a, matching_storage::Result<Vec<Candidate>>> {
		let candidates = {
			let state = lock(&self.state);

			matching::rank_candidates(reference, state.profiles.values())
		};

		Box::pin(async move { Ok(candidates) })
	}
}

#[derive(Debug, Default)]
struct SignalState {
	trust: HashMap<i64, f64>,
	subscribed: HashMap<i64, bool>,
	failure: Option<String>,
	delay: Option<Duration>,
	lookups: usize,
}

/// Trust and subscription signals held in maps. Can be told to fail or to stall.
#[derive(Debug, Default)]
pub struct MemorySignals {
	state: Mutex<SignalState>,
}
impl MemorySignals {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_trust(&self, member_id: i64, trust_score: f64) {
		lock(&self.state).trust.insert(member_id, trust_score);
	}

	pub fn set_subscribed(&self, member_id: i64, subscribed: bool) {
		lock(&self.state).subscribed.insert(member_id, subscribed);
	}

	/// Every following lookup fails with `message`.
	pub fn fail_with(&self, message: impl Into<String>) {
		lock(&self.state).failure = Some(message.into());
	}

	/// Every following lookup waits `delay` before answering.
	pub fn stall_for(&self, delay: Duration) {
		lock(&self.state).delay = Some(delay);
	}

	pub fn lookups(&self) -> usize {
		lock(&self.state).lookups
	}
}
impl MemberSignals for MemorySignals {
	fn lookup<'a>(
		&'a self,
		member_ids: &'a [i64],
	) -> BoxFuture<'a, matching_storage::Result<Vec<SignalLookup>>> {
		let (result, delay) = {
			let mut state = lock(&self.state);

			state.lookups += 1;

			let result = match &state.failure {
				Some(message) => Err(matching_storage::Error::Timeout(message.clone())),
				None => Ok(member_ids
					.iter()
					.map(|member_id| SignalLookup {
						trust_score: state.trust.get(member_id).copied(),
						subscribed: state.subscribed.get(member_id).copied(),
					})
					.collect()),
			};

			(result, state.delay)
		};

		Box::pin(async move {
			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			result
		})
	}
}

#[derive(Debug)]
enum QueueEntry {
	Request(NotificationRequest),
	Undecodable(String),
}

#[derive(Debug, Default)]
struct QueueState {
	list: VecDeque<QueueEntry>,
	in_queue: HashSet<Uuid>,
}

/// Deduplicated FIFO with list and membership set guarded by one mutex.
#[derive(Debug, Default)]
pub struct MemoryRetryQueue {
	state: Mutex<QueueState>,
}
impl MemoryRetryQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queued requests, oldest first. Undecodable entries are left out.
	pub fn snapshot(&self) -> Vec<NotificationRequest> {
		lock(&self.state)
			.list
			.iter()
			.rev()
			.filter_map(|entry| match entry {
				QueueEntry::Request(request) => Some(request.clone()),
				QueueEntry::Undecodable(_) => None,
			})
			.collect()
	}

	/// Pushes a raw payload that is decoded only on dequeue, like an entry written to Redis by
	/// another producer.
	pub fn push_undecodable(&self, payload: impl Into<String>) {
		lock(&self.state).list.push_front(QueueEntry::Undecodable(payload.into()));
	}

	pub fn contains(&self, uuid: Uuid) -> bool {
		lock(&self.state).in_queue.contains(&uuid)
	}
}
impl RetryQueue for MemoryRetryQueue {
	fn enqueue<'a>(
		&'a self,
		request: &'a NotificationRequest,
	) -> BoxFuture<'a, matching_storage::Result<bool>> {
		let inserted = {
			let mut state = lock(&self.state);
			let inserted = state.in_queue.insert(request.uuid());

			if inserted {
				state.list.push_front(QueueEntry::Request(request.clone()));
			}

			inserted
		};

		Box::pin(async move { Ok(inserted) })
	}

	fn dequeue(&self) -> BoxFuture<'_, matching_storage::Result<Option<NotificationRequest>>> {
		let popped = {
			let mut state = lock(&self.state);

			match state.list.pop_back() {
				Some(QueueEntry::Request(request)) => {
					state.in_queue.remove(&request.uuid());

					Ok(Some(request))
				},
				Some(QueueEntry::Undecodable(payload)) =>
					match serde_json::from_str::<NotificationRequest>(&payload) {
						Ok(request) => Ok(Some(request)),
						Err(source) => Err(matching_storage::Error::UndecodableEntry { payload, source }),
					},
				None => Ok(None),
			}
		};

		Box::pin(async move { popped })
	}

	fn stats(&self) -> BoxFuture<'_, matching_storage::Result<QueueStats>> {
		let stats = {
			let state = lock(&self.state);

			QueueStats { queued: state.list.len() as u64, fingerprints: state.in_queue.len() as u64 }
		};

		Box::pin(async move { Ok(stats) })
	}
}

#[derive(Debug)]
struct SinkState {
	script: VecDeque<Result<(), SinkError>>,
	fallback: Result<(), SinkError>,
	calls: Vec<NotificationRequest>,
}

/// Notification sink that answers from a script and records every request it sees.
///
/// Scripted answers are used first, in order; afterwards every call gets the fallback answer.
#[derive(Debug)]
pub struct ScriptedSink {
	state: Mutex<SinkState>,
}
impl ScriptedSink {
	pub fn succeeding() -> Self {
		Self::with_fallback(Ok(()))
	}

	pub fn failing(err: SinkError) -> Self {
		Self::with_fallback(Err(err))
	}

	fn with_fallback(fallback: Result<(), SinkError>) -> Self {
		Self {
			state: Mutex::new(SinkState { script: VecDeque::new(), fallback, calls: Vec::new() }),
		}
	}

	pub fn push(&self, answer: Result<(), SinkError>) {
		lock(&self.state).script.push_back(answer);
	}

	pub fn set_fallback(&self, answer: Result<(), SinkError>) {
		lock(&self.state).fallback = answer;
	}

	pub fn calls(&self) -> Vec<NotificationRequest> {
		lock(&self.state).calls.clone()
	}

	pub fn call_count(&self) -> usize {
		lock(&self.state).calls.len()
	}
}
impl NotificationSink for ScriptedSink {
	fn send<'a>(
		&'a self,
		request: &'a NotificationRequest,
	) -> BoxFuture<'a, matching_notify::Result<()>> {
		let answer = {
			let mut state = lock(&self.state);

			state.calls.push(request.clone());

			match state.script.pop_front() {
				Some(answer) => answer,
				None => state.fallback.clone(),
			}
		};

		Box::pin(async move { answer })
	}
}
