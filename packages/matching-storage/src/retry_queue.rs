use matching_domain::NotificationRequest;

use crate::{Error, Result, cache::RedisCache};

pub const QUEUE_KEY: &str = "notification:queue";
pub const IN_QUEUE_KEY: &str = "notification:in_queue";

// The membership guard and the push run as one script, so list and set never diverge.
const ENQUEUE_SCRIPT: &str = r#"
if redis.call('SADD', KEYS[2], ARGV[1]) == 0 then
	return 0
end
redis.call('LPUSH', KEYS[1], ARGV[2])
return 1
"#;

const DEQUEUE_SCRIPT: &str = r#"
local payload = redis.call('RPOP', KEYS[1])
if not payload then
	return false
end
local ok, decoded = pcall(cjson.decode, payload)
if ok and type(decoded) == 'table' and decoded['uuid'] then
	redis.call('SREM', KEYS[2], decoded['uuid'])
end
return payload
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
	pub queued: u64,
	pub fingerprints: u64,
}

/// Deduplicated FIFO of notification requests in Redis.
///
/// New entries go on the head of `notification:queue` and are taken from the tail. The set
/// `notification:in_queue` holds the uuid of every queued request.
#[derive(Clone)]
pub struct RedisRetryQueue {
	cache: RedisCache,
}
impl RedisRetryQueue {
	pub fn new(cache: RedisCache) -> Self {
		Self { cache }
	}

	/// Returns `false` when a request with the same uuid is already queued.
	pub async fn enqueue(&self, request: &NotificationRequest) -> Result<bool> {
		let payload = serde_json::to_string(request)?;
		let uuid = request.uuid().to_string();
		let script = redis::Script::new(ENQUEUE_SCRIPT);
		let mut conn = self.cache.connection();
		let mut invocation = script.key(QUEUE_KEY);

		invocation.key(IN_QUEUE_KEY).arg(uuid).arg(payload);

		let inserted: i32 = self.cache.bounded("enqueue", invocation.invoke_async(&mut conn)).await?;

		Ok(inserted == 1)
	}

	/// Pops the oldest entry. An entry that does not decode is still removed and comes back as
	/// [`Error::UndecodableEntry`].
	pub async fn dequeue(&self) -> Result<Option<NotificationRequest>> {
		let script = redis::Script::new(DEQUEUE_SCRIPT);
		let mut conn = self.cache.connection();
		let mut invocation = script.key(QUEUE_KEY);

		invocation.key(IN_QUEUE_KEY);

		let payload: Option<String> =
			self.cache.bounded("dequeue", invocation.invoke_async(&mut conn)).await?;
		let Some(payload) = payload else {
			return Ok(None);
		};

		match serde_json::from_str(&payload) {
			Ok(request) => Ok(Some(request)),
			Err(source) => Err(Error::UndecodableEntry { payload, source }),
		}
	}

	pub async fn stats(&self) -> Result<QueueStats> {
		let mut conn = self.cache.connection();
		let (queued, fingerprints): (u64, u64) = self
			.cache
			.bounded(
				"queue stats",
				redis::pipe()
					.cmd("LLEN")
					.arg(QUEUE_KEY)
					.cmd("SCARD")
					.arg(IN_QUEUE_KEY)
					.query_async(&mut conn),
			)
			.await?;

		Ok(QueueStats { queued, fingerprints })
	}
}
