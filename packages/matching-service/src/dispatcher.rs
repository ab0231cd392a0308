use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use matching_config::NotificationRetry;
use matching_domain::NotificationRequest;
use matching_notify::SinkError;

use crate::{CallNotPermitted, CircuitBreaker, NotificationSink, RetryQueue};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
	#[error(transparent)]
	CallNotPermitted(#[from] CallNotPermitted),
	#[error(transparent)]
	Sink(#[from] SinkError),
}
impl DeliveryError {
	pub fn class(&self) -> &'static str {
		match self {
			Self::CallNotPermitted(_) => "call_not_permitted",
			Self::Sink(err) => err.class(),
		}
	}

	pub fn is_service_unavailable(&self) -> bool {
		matches!(self, Self::Sink(err) if err.is_service_unavailable())
	}
}

/// What became of a request handed to [`Dispatcher::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
	Delivered,
	/// Delivery failed and the request is now in the retry queue.
	Queued,
	/// Delivery failed and the retry queue already held the same uuid.
	Duplicate,
	/// Delivery failed and the retry queue could not be written.
	Lost,
}

/// Sends notifications through the circuit breaker with bounded retries and falls back to the
/// retry queue.
pub struct Dispatcher {
	sink: Arc<dyn NotificationSink>,
	queue: Arc<dyn RetryQueue>,
	breaker: Arc<CircuitBreaker>,
	max_attempts: u32,
	wait: Duration,
}
impl Dispatcher {
	pub fn new(
		cfg: &NotificationRetry,
		sink: Arc<dyn NotificationSink>,
		queue: Arc<dyn RetryQueue>,
		breaker: Arc<CircuitBreaker>,
	) -> Self {
		Self {
			sink,
			queue,
			breaker,
			max_attempts: cfg.max_attempts.max(1),
			wait: Duration::from_millis(cfg.wait_ms),
		}
	}

	pub fn breaker(&self) -> &CircuitBreaker {
		&self.breaker
	}

	/// Delivers `request` or enqueues it for the retry scheduler. Never fails.
	pub async fn send(&self, request: &NotificationRequest) -> DispatchOutcome {
		let err = match self.try_deliver(request).await {
			Ok(()) => return DispatchOutcome::Delivered,
			Err(err) => err,
		};

		if err.is_service_unavailable() {
			tracing::warn!(
				member_id = request.member_id,
				uuid = %request.uuid(),
				"Notification service unavailable. Waiting for recovery."
			);
		}

		tracing::error!(
			member_id = request.member_id,
			uuid = %request.uuid(),
			class = err.class(),
			error = %err,
			"Notification delivery failed. Falling back to the retry queue."
		);

		match self.queue.enqueue(request).await {
			Ok(true) => {
				tracing::info!(
					member_id = request.member_id,
					uuid = %request.uuid(),
					retry_count = request.retry_count,
					"Notification enqueued for retry."
				);

				DispatchOutcome::Queued
			},
			Ok(false) => {
				tracing::warn!(
					uuid = %request.uuid(),
					"Notification already queued. Skipping duplicate."
				);

				DispatchOutcome::Duplicate
			},
			Err(err) => {
				tracing::error!(
					member_id = request.member_id,
					uuid = %request.uuid(),
					error = %err,
					"Failed to enqueue notification for retry."
				);

				DispatchOutcome::Lost
			},
		}
	}

	/// One guarded delivery: a breaker permit, then up to `max_attempts` sink calls.
	///
	/// Connect failures, timeouts, 5xx, 408 and 429 are retried. Other 4xx responses end the loop
	/// and do not count against the breaker.
	pub async fn try_deliver(&self, request: &NotificationRequest) -> Result<(), DeliveryError> {
		let permit = self.breaker.try_acquire(Instant::now())?;
		let mut attempt = 1;

		loop {
			let err = match self.sink.send(request).await {
				Ok(()) => {
					permit.success(Instant::now());

					return Ok(());
				},
				Err(err) => err,
			};

			if !err.is_retryable() {
				if matches!(err, SinkError::Status(_)) {
					permit.success(Instant::now());
				} else {
					permit.failure(Instant::now());
				}

				return Err(err.into());
			}
			if attempt >= self.max_attempts {
				permit.failure(Instant::now());

				return Err(err.into());
			}

			tracing::debug!(
				uuid = %request.uuid(),
				attempt,
				class = err.class(),
				"Retrying notification delivery."
			);

			attempt += 1;

			tokio::time::sleep(self.wait).await;
		}
	}
}
