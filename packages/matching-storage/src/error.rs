#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Redis(#[from] redis::RedisError),
	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
	#[error("Stored row is invalid: {0}")]
	InvalidRow(#[from] matching_domain::Error),
	#[error("Member {member_id} already has {limit} active {category} profiles.")]
	LimitExceeded { member_id: i64, category: String, limit: u32 },
	#[error("Matching profile {matching_id} changed since version {expected}.")]
	VersionConflict { matching_id: i64, expected: i64 },
	/// The entry was already removed from the queue when decoding failed.
	#[error("Retry queue entry could not be decoded: {source}")]
	UndecodableEntry { payload: String, source: serde_json::Error },
	#[error("Redis operation timed out: {0}")]
	Timeout(String),
}
