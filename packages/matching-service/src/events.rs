use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use tokio::sync::{Mutex, mpsc};

use matching_domain::{Profile, QueryProjection};

/// Emitted after a committed insert or update of an active profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSaved {
	pub matching_id: i64,
	pub projection: QueryProjection,
}
impl From<&Profile> for ProfileSaved {
	fn from(profile: &Profile) -> Self {
		Self { matching_id: profile.matching_id(), projection: profile.projection() }
	}
}

#[derive(Debug, Default)]
pub struct EventStats {
	published: AtomicU64,
	rejected: AtomicU64,
	processed: AtomicU64,
	failed: AtomicU64,
}
impl EventStats {
	pub fn record_processed(&self) {
		self.processed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_failed(&self) {
		self.failed.fetch_add(1, Ordering::Relaxed);
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventStatsSnapshot {
	pub published: u64,
	pub rejected: u64,
	pub processed: u64,
	pub failed: u64,
	pub depth: usize,
}

/// Bounded in-process channel from profile writes to the fan-out workers.
///
/// Publishing never blocks the writer. When the queue is full or every receiver is gone the event
/// is dropped and counted as rejected.
#[derive(Clone)]
pub struct EventBus {
	sender: mpsc::Sender<ProfileSaved>,
	stats: Arc<EventStats>,
}
impl EventBus {
	pub fn new(capacity: usize) -> (Self, EventReceiver) {
		let (sender, receiver) = mpsc::channel(capacity.max(1));
		let stats = Arc::new(EventStats::default());
		let receiver =
			EventReceiver { inner: Arc::new(Mutex::new(receiver)), stats: stats.clone() };

		(Self { sender, stats }, receiver)
	}

	pub fn publish(&self, event: ProfileSaved) -> bool {
		match self.sender.try_send(event) {
			Ok(()) => {
				self.stats.published.fetch_add(1, Ordering::Relaxed);

				true
			},
			Err(mpsc::error::TrySendError::Full(event)) => {
				self.stats.rejected.fetch_add(1, Ordering::Relaxed);

				tracing::warn!(
					matching_id = event.matching_id,
					member_id = event.projection.member_id,
					"Fan-out queue is full. Dropping profile event."
				);

				false
			},
			Err(mpsc::error::TrySendError::Closed(event)) => {
				self.stats.rejected.fetch_add(1, Ordering::Relaxed);

				tracing::warn!(
					matching_id = event.matching_id,
					member_id = event.projection.member_id,
					"Fan-out queue is closed. Dropping profile event."
				);

				false
			},
		}
	}

	pub fn stats(&self) -> EventStatsSnapshot {
		EventStatsSnapshot {
			published: self.stats.published.load(Ordering::Relaxed),
			rejected: self.stats.rejected.load(Ordering::Relaxed),
			processed: self.stats.processed.load(Ordering::Relaxed),
			failed: self.stats.failed.load(Ordering::Relaxed),
			depth: self.sender.max_capacity() - self.sender.capacity(),
		}
	}
}

/// Shared receiving end. Workers take turns pulling from it.
#[derive(Clone)]
pub struct EventReceiver {
	inner: Arc<Mutex<mpsc::Receiver<ProfileSaved>>>,
	stats: Arc<EventStats>,
}
impl EventReceiver {
	pub async fn recv(&self) -> Option<ProfileSaved> {
		self.inner.lock().await.recv().await
	}

	pub fn stats(&self) -> &EventStats {
		&self.stats
	}
}
