use std::{
	collections::VecDeque,
	sync::{Mutex, MutexGuard},
	time::{Duration, Instant},
};

use matching_config::NotificationCircuitBreaker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
	Closed,
	Open,
	HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Circuit breaker is open. Call not permitted.")]
pub struct CallNotPermitted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Closed,
	Open { opened_at: Instant },
	HalfOpen { in_flight: u32, successes: u32 },
}

#[derive(Debug)]
struct Inner {
	phase: Phase,
	// Bumped on every phase change. Permits carry the generation that admitted them.
	generation: u64,
	// `true` marks a failed call. Oldest first.
	window: VecDeque<bool>,
}
impl Inner {
	fn enter(&mut self, phase: Phase) {
		self.phase = phase;
		self.generation = self.generation.wrapping_add(1);
	}
}

/// Closed, open and half-open gate in front of the notification sink.
///
/// While closed, outcomes are kept in a sliding window of the most recent calls. Once the window
/// holds at least `minimum_calls` outcomes and the failure percentage reaches the threshold the
/// breaker opens. After the cooldown a limited number of trial calls is let through; one failed
/// trial reopens the breaker, enough successful trials close it. An outcome reported after the
/// breaker has changed phase since its call was admitted is ignored.
#[derive(Debug)]
pub struct CircuitBreaker {
	window_size: usize,
	minimum_calls: usize,
	failure_rate_threshold: f32,
	open_cooldown: Duration,
	half_open_permits: u32,
	inner: Mutex<Inner>,
}
impl CircuitBreaker {
	pub fn new(cfg: &NotificationCircuitBreaker) -> Self {
		let window_size = cfg.sliding_window_size.max(1) as usize;

		Self {
			window_size,
			minimum_calls: (cfg.minimum_calls.max(1) as usize).min(window_size),
			failure_rate_threshold: cfg.failure_rate_threshold,
			open_cooldown: Duration::from_millis(cfg.open_cooldown_ms),
			half_open_permits: cfg.half_open_permitted_calls.max(1),
			inner: Mutex::new(Inner {
				phase: Phase::Closed,
				generation: 0,
				window: VecDeque::with_capacity(window_size),
			}),
		}
	}

	pub fn state(&self) -> BreakerState {
		match self.lock().phase {
			Phase::Closed => BreakerState::Closed,
			Phase::Open { .. } => BreakerState::Open,
			Phase::HalfOpen { .. } => BreakerState::HalfOpen,
		}
	}

	pub fn try_acquire(&self, now: Instant) -> Result<CallPermit<'_>, CallNotPermitted> {
		let mut inner = self.lock();

		match inner.phase {
			Phase::Closed => Ok(CallPermit::new(self, inner.generation, false)),
			Phase::Open { opened_at }
				if now.saturating_duration_since(opened_at) >= self.open_cooldown =>
			{
				inner.enter(Phase::HalfOpen { in_flight: 1, successes: 0 });

				tracing::info!("Circuit breaker half-open. Letting trial calls through.");

				Ok(CallPermit::new(self, inner.generation, true))
			},
			Phase::Open { .. } => Err(CallNotPermitted),
			Phase::HalfOpen { in_flight, successes } => {
				if in_flight + successes >= self.half_open_permits {
					return Err(CallNotPermitted);
				}

				inner.phase = Phase::HalfOpen { in_flight: in_flight + 1, successes };

				Ok(CallPermit::new(self, inner.generation, true))
			},
		}
	}

	fn lock(&self) -> MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn record(&self, generation: u64, failed: bool, now: Instant) {
		let mut inner = self.lock();

		if inner.generation != generation {
			tracing::debug!(failed, "Ignoring outcome of a call admitted before the last transition.");

			return;
		}

		match inner.phase {
			Phase::Closed => {
				inner.window.push_back(failed);

				while inner.window.len() > self.window_size {
					inner.window.pop_front();
				}

				if inner.window.len() < self.minimum_calls {
					return;
				}

				let failures = inner.window.iter().filter(|failed| **failed).count();
				let rate = failures as f32 * 100.0 / inner.window.len() as f32;

				if rate >= self.failure_rate_threshold {
					inner.enter(Phase::Open { opened_at: now });
					inner.window.clear();

					tracing::warn!(
						failure_rate = rate,
						threshold = self.failure_rate_threshold,
						"Circuit breaker opened."
					);
				}
			},
			Phase::HalfOpen { .. } if failed => {
				inner.enter(Phase::Open { opened_at: now });

				tracing::warn!("Circuit breaker trial call failed. Reopening.");
			},
			Phase::HalfOpen { in_flight, successes } => {
				let successes = successes + 1;

				if successes >= self.half_open_permits {
					inner.enter(Phase::Closed);
					inner.window.clear();

					tracing::info!("Circuit breaker closed.");
				} else {
					inner.phase =
						Phase::HalfOpen { in_flight: in_flight.saturating_sub(1), successes };
				}
			},
			// Open admits no calls, so no permit of this generation exists.
			Phase::Open { .. } => {},
		}
	}

	fn release(&self, generation: u64) {
		let mut inner = self.lock();

		if inner.generation != generation {
			return;
		}
		if let Phase::HalfOpen { in_flight, successes } = inner.phase {
			inner.phase = Phase::HalfOpen { in_flight: in_flight.saturating_sub(1), successes };
		}
	}
}

/// Admission for one guarded call. Report the outcome with [`CallPermit::success`] or
/// [`CallPermit::failure`]; dropping it unreported frees a half-open trial slot without counting.
#[derive(Debug)]
pub struct CallPermit<'a> {
	breaker: &'a CircuitBreaker,
	generation: u64,
	trial: bool,
	reported: bool,
}
impl<'a> CallPermit<'a> {
	fn new(breaker: &'a CircuitBreaker, generation: u64, trial: bool) -> Self {
		Self { breaker, generation, trial, reported: false }
	}

	pub fn success(mut self, now: Instant) {
		self.reported = true;
		self.breaker.record(self.generation, false, now);
	}

	pub fn failure(mut self, now: Instant) {
		self.reported = true;
		self.breaker.record(self.generation, true, now);
	}
}
impl Drop for CallPermit<'_> {
	fn drop(&mut self) {
		if !self.reported && self.trial {
			self.breaker.release(self.generation);
		}
	}
}
