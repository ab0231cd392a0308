use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use matching_config::Config;
use matching_notify::HttpNotificationSink;
use matching_service::{CircuitBreaker, Dispatcher, NotificationSink, RetryQueue, RetryScheduler};
use matching_storage::{cache::RedisCache, retry_queue::RedisRetryQueue};

#[derive(Debug, Parser)]
#[command(
	version = matching_cli::VERSION,
	rename_all = "kebab",
	styles = matching_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Drain the retry queue once and exit.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = matching_config::load(&args.config)?;

	init_tracing(&config);

	let cache = RedisCache::connect(&config.storage.redis).await?;
	let queue = RedisRetryQueue::new(cache);
	let stats = queue.stats().await?;

	tracing::info!(
		queued = stats.queued,
		fingerprints = stats.fingerprints,
		interval_secs = config.scheduler.retry_interval_secs,
		max_retry_count = config.scheduler.max_retry_count,
		"Retry worker starting."
	);

	let sink = HttpNotificationSink::new(&config.notification)?;
	let scheduler = scheduler(&config, Arc::new(queue), Arc::new(sink));

	if args.once {
		let report = scheduler.tick().await?;

		tracing::info!(
			drained = report.drained,
			delivered = report.delivered,
			requeued = report.requeued,
			dropped = report.dropped,
			skipped = report.skipped,
			"Retry queue drained once."
		);

		return Ok(());
	}

	scheduler.run().await;

	Ok(())
}

/// Builds the retry scheduler with its own circuit breaker. The breaker is per process, so the
/// worker and the API track the notification service independently.
pub fn scheduler(
	config: &Config,
	queue: Arc<dyn RetryQueue>,
	sink: Arc<dyn NotificationSink>,
) -> RetryScheduler {
	let breaker = Arc::new(CircuitBreaker::new(&config.notification.circuit_breaker));
	let dispatcher =
		Arc::new(Dispatcher::new(&config.notification.retry, sink, queue.clone(), breaker));

	RetryScheduler::new(&config.scheduler, queue, dispatcher)
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
