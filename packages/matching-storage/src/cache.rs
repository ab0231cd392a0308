use std::{future::Future, time::Duration};

use redis::aio::ConnectionManager;

use crate::{Error, Result};

/// Shared Redis handle. Clones are cheap and multiplex over one managed connection.
#[derive(Clone)]
pub struct RedisCache {
	manager: ConnectionManager,
	op_timeout: Duration,
}
impl RedisCache {
	pub async fn connect(cfg: &matching_config::Redis) -> Result<Self> {
		let client = redis::Client::open(cfg.url.as_str())?;
		let manager = ConnectionManager::new(client).await?;

		Ok(Self { manager, op_timeout: Duration::from_millis(cfg.op_timeout_ms) })
	}

	pub(crate) fn connection(&self) -> ConnectionManager {
		self.manager.clone()
	}

	/// Bounds a Redis round trip by the configured operation timeout.
	pub(crate) async fn bounded<T, F>(&self, label: &str, fut: F) -> Result<T>
	where
		F: Future<Output = redis::RedisResult<T>>,
	{
		match tokio::time::timeout(self.op_timeout, fut).await {
			Ok(result) => Ok(result?),
			Err(_) => Err(Error::Timeout(format!("{label} exceeded {:?}.", self.op_timeout))),
		}
	}
}
