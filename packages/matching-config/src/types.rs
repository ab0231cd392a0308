use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub notification: Notification,
	#[serde(default)]
	pub matching: Matching,
	#[serde(default)]
	pub scheduler: Scheduler,
	#[serde(default)]
	pub fanout: Fanout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub redis: Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Redis {
	pub url: String,
	#[serde(default = "default_redis_op_timeout_ms")]
	pub op_timeout_ms: u64,
}

/// Remote notification sink plus the resilience policy wrapped around it.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
	/// Base URL of the notification service; requests go to `{service_url}/notifications`.
	pub service_url: String,
	/// Per-attempt timeout.
	#[serde(default = "default_notification_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub retry: NotificationRetry,
	#[serde(default)]
	pub circuit_breaker: NotificationCircuitBreaker,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationRetry {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	pub wait_ms: u64,
}
impl Default for NotificationRetry {
	fn default() -> Self {
		Self { max_attempts: 3, wait_ms: 500 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationCircuitBreaker {
	/// Number of most recent calls considered when computing the failure rate.
	pub sliding_window_size: u32,
	/// Calls required in the window before the failure rate is evaluated.
	pub minimum_calls: u32,
	/// Failure rate in percent at which the breaker opens.
	pub failure_rate_threshold: f32,
	pub open_cooldown_ms: u64,
	pub half_open_permitted_calls: u32,
}
impl Default for NotificationCircuitBreaker {
	fn default() -> Self {
		Self {
			sliding_window_size: 10,
			minimum_calls: 5,
			failure_rate_threshold: 50.0,
			open_cooldown_ms: 30_000,
			half_open_permitted_calls: 1,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Matching {
	pub top_k: u32,
	/// Rerank runs only when the candidate query returns more rows than this.
	pub rerank_threshold: u32,
	pub max_active_per_category: u32,
	pub signal_timeout_ms: u64,
}
impl Default for Matching {
	fn default() -> Self {
		Self { top_k: 20, rerank_threshold: 20, max_active_per_category: 3, signal_timeout_ms: 500 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scheduler {
	pub retry_interval_secs: u64,
	pub max_retry_count: u32,
}
impl Default for Scheduler {
	fn default() -> Self {
		Self { retry_interval_secs: 600, max_retry_count: 3 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Fanout {
	pub workers: u32,
	pub queue_capacity: u32,
}
impl Default for Fanout {
	fn default() -> Self {
		Self { workers: 4, queue_capacity: 1_024 }
	}
}

fn default_redis_op_timeout_ms() -> u64 {
	500
}

fn default_notification_timeout_ms() -> u64 {
	3_000
}
