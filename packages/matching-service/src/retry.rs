use std::{sync::Arc, time::Duration};

use matching_config::Scheduler;
use matching_domain::NotificationRequest;

use crate::{Dispatcher, Result, RetryQueue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
	pub drained: usize,
	pub delivered: usize,
	pub requeued: usize,
	pub dropped: usize,
	/// Entries removed from the queue that could not be decoded.
	pub skipped: usize,
}

/// Periodically drains the retry queue through the dispatcher.
///
/// Requests that fail again are re-enqueued with an incremented retry count once the queue is
/// empty, so each tick sends every queued request at most once. Requests whose retry count has
/// reached the cap are dropped.
pub struct RetryScheduler {
	queue: Arc<dyn RetryQueue>,
	dispatcher: Arc<Dispatcher>,
	max_retry_count: u32,
	interval: Duration,
}
impl RetryScheduler {
	pub fn new(cfg: &Scheduler, queue: Arc<dyn RetryQueue>, dispatcher: Arc<Dispatcher>) -> Self {
		Self {
			queue,
			dispatcher,
			max_retry_count: cfg.max_retry_count,
			interval: Duration::from_secs(cfg.retry_interval_secs),
		}
	}

	pub async fn run(&self) {
		let mut ticker = tokio::time::interval(self.interval);

		ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

		loop {
			ticker.tick().await;

			match self.tick().await {
				Ok(report) if report.drained > 0 || report.skipped > 0 => {
					tracing::info!(
						drained = report.drained,
						delivered = report.delivered,
						requeued = report.requeued,
						dropped = report.dropped,
						skipped = report.skipped,
						"Retry queue drained."
					);
				},
				Ok(_) => {},
				Err(err) => {
					tracing::error!(error = %err, "Retry queue drain failed.");
				},
			}
		}
	}

	pub async fn tick(&self) -> Result<DrainReport> {
		let mut report = DrainReport::default();
		let mut pending = Vec::new();
		let drained = self.drain(&mut report, &mut pending).await;

		for request in pending {
			match self.queue.enqueue(&request).await {
				Ok(_) => report.requeued += 1,
				Err(err) => {
					tracing::error!(
						member_id = request.member_id,
						uuid = %request.uuid(),
						retry_count = request.retry_count,
						error = %err,
						"Failed to re-enqueue notification."
					);
				},
			}
		}

		drained.map(|()| report)
	}

	async fn drain(
		&self,
		report: &mut DrainReport,
		pending: &mut Vec<NotificationRequest>,
	) -> Result<()> {
		loop {
			let mut request = match self.queue.dequeue().await {
				Ok(Some(request)) => request,
				Ok(None) => break,
				Err(matching_storage::Error::UndecodableEntry { payload, source }) => {
					report.skipped += 1;

					tracing::error!(
						payload = payload.as_str(),
						error = %source,
						"Skipping undecodable retry queue entry."
					);

					continue;
				},
				Err(err) => return Err(err.into()),
			};

			report.drained += 1;

			tracing::info!(
				member_id = request.member_id,
				uuid = %request.uuid(),
				retry_count = request.retry_count,
				"Notification dequeued for retry."
			);

			if request.retry_count >= self.max_retry_count {
				report.dropped += 1;

				tracing::warn!(
					member_id = request.member_id,
					uuid = %request.uuid(),
					retry_count = request.retry_count,
					"Notification reached the retry limit. Dropping."
				);

				continue;
			}

			match self.dispatcher.try_deliver(&request).await {
				Ok(()) => report.delivered += 1,
				Err(err) => {
					tracing::error!(
						member_id = request.member_id,
						uuid = %request.uuid(),
						retry_count = request.retry_count,
						class = err.class(),
						error = %err,
						"Notification retry failed."
					);

					request.increase_retry_count();
					pending.push(request);
				},
			}
		}

		Ok(())
	}
}
