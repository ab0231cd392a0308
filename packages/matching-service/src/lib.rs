pub mod breaker;
pub mod candidates;
pub mod create;
pub mod delete;
pub mod dispatcher;
pub mod events;
pub mod fanout;
pub mod list;
pub mod retry;
pub mod update;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde::Serialize;
use time::OffsetDateTime;

pub use breaker::{BreakerState, CallNotPermitted, CallPermit, CircuitBreaker};
pub use candidates::{CandidateQuery, RankedCandidate};
pub use create::{CreateRequest, ProfileInput};
pub use delete::DeleteRequest;
pub use dispatcher::{DeliveryError, DispatchOutcome, Dispatcher};
pub use error::{Error, Result};
pub use events::{EventBus, EventReceiver, EventStats, EventStatsSnapshot, ProfileSaved};
pub use fanout::{FanOut, spawn_workers};
pub use list::ListRequest;
pub use retry::{DrainReport, RetryScheduler};
pub use update::{UpdateInput, UpdateRequest};

use matching_config::Config;
use matching_domain::{
	Age, Candidate, Category, Level, MostActiveTime, NewProfile, NotificationRequest, Profile,
	ProfileStatus, QueryProjection, SignalLookup,
};
use matching_notify::HttpNotificationSink;
use matching_storage::{
	cache::RedisCache,
	db::Db,
	queries,
	retry_queue::{QueueStats, RedisRetryQueue},
	signals,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence of profile records.
pub trait ProfileStore
where
	Self: Send + Sync,
{
	/// Inserts unless the owner already holds `limit` active profiles in the category.
	fn insert<'a>(
		&'a self,
		profile: &'a NewProfile,
		limit: u32,
		now: OffsetDateTime,
	) -> BoxFuture<'a, matching_storage::Result<Profile>>;

	/// Writes `profile` if the stored version still equals `profile.version()`.
	fn update<'a>(
		&'a self,
		profile: &'a Profile,
		now: OffsetDateTime,
	) -> BoxFuture<'a, matching_storage::Result<Profile>>;

	fn find(&self, matching_id: i64) -> BoxFuture<'_, matching_storage::Result<Option<Profile>>>;

	fn list_by_category_and_member(
		&self,
		category: Category,
		member_id: i64,
	) -> BoxFuture<'_, matching_storage::Result<Vec<Profile>>>;

	fn list_by_member(&self, member_id: i64) -> BoxFuture<'_, matching_storage::Result<Vec<Profile>>>;

	fn find_candidates<'a>(
		&'a self,
		reference: &'a QueryProjection,
	) -> BoxFuture<'a, matching_storage::Result<Vec<Candidate>>>;
}

/// Read-only trust and subscription signals, one lookup per member in input order.
pub trait MemberSignals
where
	Self: Send + Sync,
{
	fn lookup<'a>(
		&'a self,
		member_ids: &'a [i64],
	) -> BoxFuture<'a, matching_storage::Result<Vec<SignalLookup>>>;
}

/// Deduplicated FIFO of notification requests.
pub trait RetryQueue
where
	Self: Send + Sync,
{
	/// Returns `false` when a request with the same uuid is already queued.
	fn enqueue<'a>(
		&'a self,
		request: &'a NotificationRequest,
	) -> BoxFuture<'a, matching_storage::Result<bool>>;

	fn dequeue(&self) -> BoxFuture<'_, matching_storage::Result<Option<NotificationRequest>>>;

	fn stats(&self) -> BoxFuture<'_, matching_storage::Result<QueueStats>>;
}

/// One delivery attempt to the remote notification service.
pub trait NotificationSink
where
	Self: Send + Sync,
{
	fn send<'a>(
		&'a self,
		request: &'a NotificationRequest,
	) -> BoxFuture<'a, matching_notify::Result<()>>;
}

/// Public view of a stored profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
	pub matching_id: i64,
	pub member_id: i64,
	pub category: Category,
	pub most_active_time: MostActiveTime,
	pub level: Level,
	pub age: Age,
	pub is_attending: bool,
	pub introduction: String,
	pub status: ProfileStatus,
	pub version: i64,
	#[serde(with = "matching_domain::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "matching_domain::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<&Profile> for ProfileResponse {
	fn from(profile: &Profile) -> Self {
		Self {
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
}

/// The external collaborators of the matching pipeline.
#[derive(Clone)]
pub struct Ports {
	pub store: Arc<dyn ProfileStore>,
	pub signals: Arc<dyn MemberSignals>,
	pub queue: Arc<dyn RetryQueue>,
	pub sink: Arc<dyn NotificationSink>,
}
impl Ports {
	pub fn new(
		store: Arc<dyn ProfileStore>,
		signals: Arc<dyn MemberSignals>,
		queue: Arc<dyn RetryQueue>,
		sink: Arc<dyn NotificationSink>,
	) -> Self {
		Self { store, signals, queue, sink }
	}

	/// Postgres for profiles, Redis for signals and the retry queue, HTTP for the sink.
	pub fn production(db: Db, cache: RedisCache, sink: HttpNotificationSink) -> Self {
		Self {
			store: Arc::new(db),
			signals: Arc::new(cache.clone()),
			queue: Arc::new(RedisRetryQueue::new(cache)),
			sink: Arc::new(sink),
		}
	}

	pub fn candidate_query(&self, cfg: &Config) -> CandidateQuery {
		CandidateQuery::new(&cfg.matching, self.store.clone(), self.signals.clone())
	}

	pub fn dispatcher(&self, cfg: &Config, breaker: Arc<CircuitBreaker>) -> Dispatcher {
		Dispatcher::new(&cfg.notification.retry, self.sink.clone(), self.queue.clone(), breaker)
	}
}

/// Profile operations. Saves of active profiles are published on `events`.
pub struct MatchingService {
	pub cfg: Config,
	pub store: Arc<dyn ProfileStore>,
	pub events: EventBus,
}
impl MatchingService {
	pub fn new(cfg: Config, store: Arc<dyn ProfileStore>, events: EventBus) -> Self {
		Self { cfg, store, events }
	}

	pub(crate) async fn load(&self, matching_id: i64) -> Result<Profile> {
		self.store.find(matching_id).await?.ok_or(Error::NotFound { matching_id })
	}

	/// Announces a committed write. Deleted profiles never reach the fan-out.
	pub(crate) fn announce(&self, profile: &Profile) {
		if profile.is_active() {
			self.events.publish(ProfileSaved::from(profile));
		}
	}
}

impl ProfileStore for Db {
	fn insert<'a>(
		&'a self,
		profile: &'a NewProfile,
		limit: u32,
		now: OffsetDateTime,
	) -> BoxFuture<'a, matching_storage::Result<Profile>> {
		Box::pin(queries::insert_profile_limited(self, profile, limit, now))
	}

	fn update<'a>(
		&'a self,
		profile: &'a Profile,
		now: OffsetDateTime,
	) -> BoxFuture<'a, matching_storage::Result<Profile>> {
		Box::pin(queries::update_profile_versioned(self, profile, now))
	}

	fn find(&self, matching_id: i64) -> BoxFuture<'_, matching_storage::Result<Option<Profile>>> {
		Box::pin(queries::find_profile(self, matching_id))
	}

	fn list_by_category_and_member(
		&self,
		category: Category,
		member_id: i64,
	) -> BoxFuture<'_, matching_storage::Result<Vec<Profile>>> {
		Box::pin(queries::list_by_category_and_member(self, category, member_id))
	}

	fn list_by_member(&self, member_id: i64) -> BoxFuture<'_, matching_storage::Result<Vec<Profile>>> {
		Box::pin(queries::list_by_member(self, member_id))
	}

	fn find_candidates<'a>(
		&'a self,
		reference: &'a QueryProjection,
	) -> BoxFuture<'a, matching_storage::Result<Vec<Candidate>>> {
		Box::pin(queries::find_candidates(self, reference))
	}
}

impl MemberSignals for RedisCache {
	fn lookup<'a>(
		&'a self,
		member_ids: &'a [i64],
	) -> BoxFuture<'a, matching_storage::Result<Vec<SignalLookup>>> {
		Box::pin(signals::fetch_signals(self, member_ids))
	}
}

impl RetryQueue for RedisRetryQueue {
	fn enqueue<'a>(
		&'a self,
		request: &'a NotificationRequest,
	) -> BoxFuture<'a, matching_storage::Result<bool>> {
		Box::pin(RedisRetryQueue::enqueue(self, request))
	}

	fn dequeue(&self) -> BoxFuture<'_, matching_storage::Result<Option<NotificationRequest>>> {
		Box::pin(RedisRetryQueue::dequeue(self))
	}

	fn stats(&self) -> BoxFuture<'_, matching_storage::Result<QueueStats>> {
		Box::pin(RedisRetryQueue::stats(self))
	}
}

impl NotificationSink for HttpNotificationSink {
	fn send<'a>(
		&'a self,
		request: &'a NotificationRequest,
	) -> BoxFuture<'a, matching_notify::Result<()>> {
		Box::pin(HttpNotificationSink::send(self, request))
	}
}
