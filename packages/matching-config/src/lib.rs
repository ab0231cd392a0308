mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Fanout, Matching, Notification, NotificationCircuitBreaker, NotificationRetry,
	Postgres, Redis, Scheduler, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.log_level", &cfg.service.log_level),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("storage.redis.url", &cfg.storage.redis.url),
		("notification.service_url", &cfg.notification.service_url),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !cfg.notification.service_url.starts_with("http://")
		&& !cfg.notification.service_url.starts_with("https://")
	{
		return Err(Error::Validation {
			message: "notification.service_url must be an http or https URL.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.notification.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "notification.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.notification.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "notification.retry.max_attempts must be greater than zero.".to_string(),
		});
	}

	let breaker = &cfg.notification.circuit_breaker;

	if breaker.sliding_window_size == 0 {
		return Err(Error::Validation {
			message: "notification.circuit_breaker.sliding_window_size must be greater than zero."
				.to_string(),
		});
	}
	if breaker.minimum_calls > breaker.sliding_window_size {
		return Err(Error::Validation {
			message: "notification.circuit_breaker.minimum_calls must not exceed sliding_window_size."
				.to_string(),
		});
	}
	if !breaker.failure_rate_threshold.is_finite()
		|| breaker.failure_rate_threshold <= 0.0
		|| breaker.failure_rate_threshold > 100.0
	{
		return Err(Error::Validation {
			message:
				"notification.circuit_breaker.failure_rate_threshold must be in the range (0, 100]."
					.to_string(),
		});
	}
	if breaker.half_open_permitted_calls == 0 {
		return Err(Error::Validation {
			message:
				"notification.circuit_breaker.half_open_permitted_calls must be greater than zero."
					.to_string(),
		});
	}
	if cfg.matching.top_k == 0 {
		return Err(Error::Validation {
			message: "matching.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.matching.max_active_per_category == 0 {
		return Err(Error::Validation {
			message: "matching.max_active_per_category must be greater than zero.".to_string(),
		});
	}
	if cfg.scheduler.retry_interval_secs == 0 {
		return Err(Error::Validation {
			message: "scheduler.retry_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.fanout.workers == 0 {
		return Err(Error::Validation {
			message: "fanout.workers must be greater than zero.".to_string(),
		});
	}
	if cfg.fanout.queue_capacity == 0 {
		return Err(Error::Validation {
			message: "fanout.queue_capacity must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.notification.service_url.trim().trim_end_matches('/').to_string();

	cfg.notification.service_url = trimmed;
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
}
