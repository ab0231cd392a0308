use std::sync::Arc;

use time::OffsetDateTime;
use tokio::task::JoinHandle;

use matching_domain::NotificationRequest;

use crate::{CandidateQuery, DispatchOutcome, Dispatcher, EventReceiver, ProfileSaved, Result};

/// Turns a saved profile into match notifications.
pub struct FanOut {
	candidates: CandidateQuery,
	dispatcher: Arc<Dispatcher>,
}
impl FanOut {
	pub fn new(candidates: CandidateQuery, dispatcher: Arc<Dispatcher>) -> Self {
		Self { candidates, dispatcher }
	}

	/// Sends the summary to the saving member, then one notice per candidate in rank order.
	/// Returns the outcome of every dispatch in send order.
	pub async fn handle(&self, event: &ProfileSaved) -> Result<Vec<DispatchOutcome>> {
		let reference = &event.projection;
		let ranked = self.candidates.find(reference).await?;

		if ranked.is_empty() {
			tracing::info!(
				matching_id = event.matching_id,
				member_id = reference.member_id,
				"No matching candidates found."
			);

			return Ok(Vec::new());
		}

		tracing::info!(
			matching_id = event.matching_id,
			member_id = reference.member_id,
			matched = ranked.len(),
			"Matching candidates found."
		);

		let now = OffsetDateTime::now_utc();
		let mut outcomes = Vec::with_capacity(ranked.len() + 1);
		let summary = NotificationRequest::match_summary(reference, ranked.len(), now);

		outcomes.push(self.dispatcher.send(&summary).await);

		for ranked in &ranked {
			let notice = NotificationRequest::match_notice(reference, &ranked.candidate, now);

			tracing::info!(
				member_id = ranked.candidate.member_id,
				matched_with = reference.member_id,
				score = ranked.candidate.score,
				"Sending match notice."
			);

			outcomes.push(self.dispatcher.send(&notice).await);
		}

		Ok(outcomes)
	}
}

/// Starts `workers` tasks that pull events from `receiver` until every bus handle is dropped.
pub fn spawn_workers(
	workers: usize,
	receiver: EventReceiver,
	fanout: Arc<FanOut>,
) -> Vec<JoinHandle<()>> {
	(0..workers.max(1))
		.map(|worker| {
			let receiver = receiver.clone();
			let fanout = fanout.clone();

			tokio::spawn(async move {
				while let Some(event) = receiver.recv().await {
					match fanout.handle(&event).await {
						Ok(_) => receiver.stats().record_processed(),
						Err(err) => {
							receiver.stats().record_failed();

							tracing::error!(
								worker,
								matching_id = event.matching_id,
								error = %err,
								"Match fan-out failed."
							);
						},
					}
				}

				tracing::debug!(worker, "Fan-out worker stopped.");
			})
		})
		.collect()
}
