use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;

use matching_config::Redis;
use matching_domain::{NotificationRequest, NotificationType};
use matching_storage::{
	Error,
	cache::RedisCache,
	retry_queue::{QUEUE_KEY, RedisRetryQueue},
	signals::{self, subscription_key, trust_score_key},
};

// Both queue tests share the fixed queue keys.
static QUEUE_KEYS: Mutex<()> = Mutex::new(());

fn lock_queue_keys() -> MutexGuard<'static, ()> {
	QUEUE_KEYS.lock().unwrap_or_else(|err| err.into_inner())
}

async fn cache(url: &str) -> RedisCache {
	RedisCache::connect(&Redis { url: url.to_string(), op_timeout_ms: 1_000 })
		.await
		.expect("Failed to connect to Redis.")
}

fn request(member_id: i64) -> NotificationRequest {
	NotificationRequest::new(
		member_id,
		"match success! 3 users matched",
		NotificationType::MatchSuccess,
		OffsetDateTime::now_utc(),
	)
}

#[tokio::test]
#[ignore = "Requires external Redis. Set MATCHING_REDIS_URL to run."]
async fn retry_queue_is_fifo_and_deduplicated() {
	let Some(url) = matching_testkit::env_redis_url() else {
		eprintln!("Skipping retry_queue_is_fifo_and_deduplicated; set MATCHING_REDIS_URL to run.");

		return;
	};

	let _keys = lock_queue_keys();

	matching_testkit::reset_retry_queue(&url).await.expect("Failed to reset queue keys.");

	let queue = RedisRetryQueue::new(cache(&url).await);
	let first = request(1);
	let second = request(2);

	assert!(queue.enqueue(&first).await.expect("Failed to enqueue."));
	assert!(!queue.enqueue(&first).await.expect("Failed to enqueue."));
	assert!(queue.enqueue(&second).await.expect("Failed to enqueue."));

	let stats = queue.stats().await.expect("Failed to read stats.");

	assert_eq!((stats.queued, stats.fingerprints), (2, 2));

	let popped = queue.dequeue().await.expect("Failed to dequeue.").expect("Expected a request.");

	assert_eq!(popped, first);
	assert_eq!(popped.uuid(), first.uuid());

	let popped = queue.dequeue().await.expect("Failed to dequeue.").expect("Expected a request.");

	assert_eq!(popped, second);
	assert!(queue.dequeue().await.expect("Failed to dequeue.").is_none());

	let stats = queue.stats().await.expect("Failed to read stats.");

	assert_eq!((stats.queued, stats.fingerprints), (0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 5)]
#[ignore = "Requires external Redis. Set MATCHING_REDIS_URL to run."]
async fn concurrent_duplicate_enqueues_keep_one_entry() {
	let Some(url) = matching_testkit::env_redis_url() else {
		eprintln!(
			"Skipping concurrent_duplicate_enqueues_keep_one_entry; set MATCHING_REDIS_URL to run."
		);

		return;
	};

	let _keys = lock_queue_keys();

	matching_testkit::reset_retry_queue(&url).await.expect("Failed to reset queue keys.");

	let queue = Arc::new(RedisRetryQueue::new(cache(&url).await));
	let request = request(5);
	let mut tasks = Vec::new();

	for _ in 0..5 {
		let queue = queue.clone();
		let request = request.clone();

		tasks.push(tokio::spawn(async move {
			let mut inserted = 0;

			for _ in 0..3 {
				if queue.enqueue(&request).await.expect("Failed to enqueue.") {
					inserted += 1;
				}
			}

			inserted
		}));
	}

	let mut inserted = 0;

	for task in tasks {
		inserted += task.await.expect("Enqueue task panicked.");
	}

	assert_eq!(inserted, 1);

	let stats = queue.stats().await.expect("Failed to read stats.");

	assert_eq!((stats.queued, stats.fingerprints), (1, 1));

	let popped = queue.dequeue().await.expect("Failed to dequeue.").expect("Expected a request.");

	assert_eq!(popped.uuid(), request.uuid());
	assert!(queue.dequeue().await.expect("Failed to dequeue.").is_none());

	let stats = queue.stats().await.expect("Failed to read stats.");

	assert_eq!((stats.queued, stats.fingerprints), (0, 0));
}

#[tokio::test]
#[ignore = "Requires external Redis. Set MATCHING_REDIS_URL to run."]
async fn undecodable_entries_are_removed_and_reported() {
	let Some(url) = matching_testkit::env_redis_url() else {
		eprintln!(
			"Skipping undecodable_entries_are_removed_and_reported; set MATCHING_REDIS_URL to run."
		);

		return;
	};
	let _keys = lock_queue_keys();

	matching_testkit::reset_retry_queue(&url).await.expect("Failed to reset queue keys.");

	let client = redis::Client::open(url.as_str()).expect("Failed to open Redis client.");
	let mut conn =
		client.get_multiplexed_async_connection().await.expect("Failed to connect to Redis.");
	let _: i64 = redis::cmd("LPUSH")
		.arg(QUEUE_KEY)
		.arg("not json")
		.query_async(&mut conn)
		.await
		.expect("Failed to seed queue.");
	let queue = RedisRetryQueue::new(cache(&url).await);
	let next = request(3);

	assert!(queue.enqueue(&next).await.expect("Failed to enqueue."));

	let err = queue.dequeue().await.expect_err("Expected the entry to fail decoding.");

	match err {
		Error::UndecodableEntry { payload, .. } => assert_eq!(payload, "not json"),
		other => panic!("Unexpected error: {other:?}"),
	}

	let popped = queue.dequeue().await.expect("Failed to dequeue.").expect("Expected a request.");

	assert_eq!(popped.uuid(), next.uuid());
	assert!(queue.dequeue().await.expect("Failed to dequeue.").is_none());
}

#[tokio::test]
#[ignore = "Requires external Redis. Set MATCHING_REDIS_URL to run."]
async fn signals_default_missing_halves() {
	let Some(url) = matching_testkit::env_redis_url() else {
		eprintln!("Skipping signals_default_missing_halves; set MATCHING_REDIS_URL to run.");

		return;
	};
	let client = redis::Client::open(url.as_str()).expect("Failed to open Redis client.");
	let mut conn =
		client.get_multiplexed_async_connection().await.expect("Failed to connect to Redis.");
	let base = i64::from(std::process::id()) * 1_000;
	let () = redis::pipe()
		.cmd("SET")
		.arg(trust_score_key(base + 1))
		.arg("87.5")
		.ignore()
		.cmd("SET")
		.arg(subscription_key(base + 1))
		.arg("true")
		.ignore()
		.cmd("SET")
		.arg(trust_score_key(base + 2))
		.arg("not-a-number")
		.ignore()
		.cmd("SET")
		.arg(subscription_key(base + 2))
		.arg("1")
		.ignore()
		.query_async(&mut conn)
		.await
		.expect("Failed to seed signals.");
	let lookups = signals::fetch_signals(&cache(&url).await, &[base + 1, base + 2, base + 3])
		.await
		.expect("Failed to fetch signals.");

	assert_eq!(lookups[0].trust_score, Some(87.5));
	assert_eq!(lookups[0].subscribed, Some(true));
	assert_eq!(lookups[1].trust_score, None);
	assert_eq!(lookups[1].subscribed, Some(true));
	assert!(!lookups[2].is_complete());
	assert_eq!(lookups[2].resolve().trust_score, 0.0);
}
