use std::sync::Arc;

use matching_config::Config;
use matching_notify::HttpNotificationSink;
use matching_service::{CircuitBreaker, EventBus, FanOut, MatchingService, Ports, fanout};
use matching_storage::{cache::RedisCache, db::Db};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MatchingService>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let cache = RedisCache::connect(&config.storage.redis).await?;
		let sink = HttpNotificationSink::new(&config.notification)?;

		Ok(Self::with_ports(config, Ports::production(db, cache, sink)))
	}

	/// Wires the service to `ports` and starts the fan-out workers. Must run inside a Tokio
	/// runtime.
	pub fn with_ports(config: Config, ports: Ports) -> Self {
		let breaker = Arc::new(CircuitBreaker::new(&config.notification.circuit_breaker));
		let dispatcher = Arc::new(ports.dispatcher(&config, breaker));
		let fanout = FanOut::new(ports.candidate_query(&config), dispatcher);
		let (events, receiver) = EventBus::new(config.fanout.queue_capacity as usize);

		fanout::spawn_workers(config.fanout.workers as usize, receiver, Arc::new(fanout));

		tracing::info!(
			workers = config.fanout.workers,
			queue_capacity = config.fanout.queue_capacity,
			"Match fan-out workers started."
		);

		let service = MatchingService::new(config, ports.store, events);

		Self { service: Arc::new(service) }
	}
}
