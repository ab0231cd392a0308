use std::{sync::Arc, time::Duration};

use matching_config::Matching;
use matching_domain::{Candidate, MemberSignal, QueryProjection, matching};

use crate::{MemberSignals, ProfileStore, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
	pub candidate: Candidate,
	/// Present when the result went through the signal rerank.
	pub signal: Option<MemberSignal>,
}
impl RankedCandidate {
	fn plain(candidate: Candidate) -> Self {
		Self { candidate, signal: None }
	}
}

/// Scored candidate lookup with the signal rerank and top-K cutoff applied to large results.
#[derive(Clone)]
pub struct CandidateQuery {
	store: Arc<dyn ProfileStore>,
	signals: Arc<dyn MemberSignals>,
	top_k: usize,
	rerank_threshold: usize,
	signal_timeout: Duration,
}
impl CandidateQuery {
	pub fn new(
		cfg: &Matching,
		store: Arc<dyn ProfileStore>,
		signals: Arc<dyn MemberSignals>,
	) -> Self {
		Self {
			store,
			signals,
			top_k: cfg.top_k as usize,
			rerank_threshold: cfg.rerank_threshold as usize,
			signal_timeout: Duration::from_millis(cfg.signal_timeout_ms),
		}
	}

	pub async fn find(&self, reference: &QueryProjection) -> Result<Vec<RankedCandidate>> {
		let candidates = self.store.find_candidates(reference).await?;

		tracing::debug!(
			member_id = reference.member_id,
			category = reference.category.as_str(),
			count = candidates.len(),
			"Scored matching candidates."
		);

		if candidates.len() <= self.rerank_threshold {
			return Ok(candidates.into_iter().map(RankedCandidate::plain).collect());
		}

		Ok(self.rerank(reference, candidates).await)
	}

	async fn rerank(
		&self,
		reference: &QueryProjection,
		candidates: Vec<Candidate>,
	) -> Vec<RankedCandidate> {
		let member_ids = candidates.iter().map(|c| c.member_id).collect::<Vec<_>>();
		let lookup = tokio::time::timeout(self.signal_timeout, self.signals.lookup(&member_ids));
		let signals = match lookup.await {
			Ok(Ok(lookups)) => member_ids
				.iter()
				.enumerate()
				.map(|(idx, member_id)| {
					let lookup = lookups.get(idx).copied().unwrap_or_default();

					if !lookup.is_complete() {
						tracing::warn!(
							member_id,
							"Member signal missing from cache. Using defaults."
						);
					}

					lookup.resolve()
				})
				.collect::<Vec<_>>(),
			Ok(Err(err)) => {
				tracing::warn!(
					member_id = reference.member_id,
					error = %err,
					"Member signal lookup failed. Returning candidates without rerank."
				);

				return candidates
					.into_iter()
					.take(self.top_k)
					.map(RankedCandidate::plain)
					.collect();
			},
			Err(_) => {
				tracing::warn!(
					member_id = reference.member_id,
					timeout_ms = self.signal_timeout.as_millis() as u64,
					"Member signal lookup timed out. Using defaults."
				);

				vec![MemberSignal::default(); member_ids.len()]
			},
		};

		matching::rerank(candidates, &signals, self.top_k)
			.into_iter()
			.map(|(candidate, signal)| RankedCandidate { candidate, signal: Some(signal) })
			.collect()
	}
}
