use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Candidate, QueryProjection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
	MatchSuccess,
}
impl NotificationType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::MatchSuccess => "MATCH_SUCCESS",
		}
	}
}

/// A message for the remote notification service.
///
/// `uuid` is fixed at construction and survives serialization, so a request read back from the
/// retry queue is the same logical request. Equality ignores `retry_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
	pub member_id: i64,
	pub content: String,
	pub notification_type: NotificationType,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
	#[serde(default)]
	pub retry_count: u32,
	uuid: Uuid,
}
impl NotificationRequest {
	pub fn new(
		member_id: i64,
		content: impl Into<String>,
		notification_type: NotificationType,
		timestamp: OffsetDateTime,
	) -> Self {
		Self {
			member_id,
			content: content.into(),
			notification_type,
			timestamp,
			retry_count: 0,
			uuid: Uuid::new_v4(),
		}
	}

	/// Summary sent to the member whose save triggered the match.
	pub fn match_summary(reference: &QueryProjection, matched: usize, now: OffsetDateTime) -> Self {
		Self::new(
			reference.member_id,
			format!("match success! {matched} users matched"),
			NotificationType::MatchSuccess,
			now,
		)
	}

	/// Notice sent to each matched candidate.
	pub fn match_notice(reference: &QueryProjection, candidate: &Candidate, now: OffsetDateTime) -> Self {
		Self::new(
			candidate.member_id,
			format!(
				"new match! matched with user {}. similarity score: {}",
				reference.member_id, candidate.score
			),
			NotificationType::MatchSuccess,
			now,
		)
	}

	pub fn uuid(&self) -> Uuid {
		self.uuid
	}

	pub fn increase_retry_count(&mut self) {
		self.retry_count = self.retry_count.saturating_add(1);
	}
}
impl PartialEq for NotificationRequest {
	fn eq(&self, other: &Self) -> bool {
		self.member_id == other.member_id
			&& self.content == other.content
			&& self.notification_type == other.notification_type
			&& self.timestamp == other.timestamp
			&& self.uuid == other.uuid
	}
}
impl Eq for NotificationRequest {}
impl Hash for NotificationRequest {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.member_id.hash(state);
		self.content.hash(state);
		self.notification_type.hash(state);
		self.timestamp.hash(state);
		self.uuid.hash(state);
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use crate::{Age, Category, Level, MostActiveTime, ProfileStatus};

	fn reference() -> QueryProjection {
		QueryProjection {
			member_id: 1,
			category: Category::Study,
			most_active_time: MostActiveTime::Morning,
			level: Level::Seed,
			age: Age::None,
			is_attending: true,
		}
	}

	#[test]
	fn wire_format_is_camel_case_with_rfc3339_timestamp() {
		let request = NotificationRequest::new(
			42,
			"hello",
			NotificationType::MatchSuccess,
			datetime!(2025-03-01 09:30:00 UTC),
		);
		let value = serde_json::to_value(&request).expect("Failed to serialize request.");

		assert_eq!(value["memberId"], 42);
		assert_eq!(value["notificationType"], "MATCH_SUCCESS");
		assert_eq!(value["timestamp"], "2025-03-01T09:30:00Z");
		assert_eq!(value["retryCount"], 0);
		assert_eq!(value["uuid"], request.uuid().to_string());
	}

	#[test]
	fn uuid_survives_round_trip_and_retry_count_is_ignored_by_eq() {
		let mut request = NotificationRequest::new(
			42,
			"hello",
			NotificationType::MatchSuccess,
			datetime!(2025-03-01 09:30:00 UTC),
		);
		let json = serde_json::to_string(&request).expect("Failed to serialize request.");
		let restored: NotificationRequest =
			serde_json::from_str(&json).expect("Failed to parse request.");

		request.increase_retry_count();

		assert_eq!(restored, request);
		assert_eq!(restored.uuid(), request.uuid());
		assert_eq!(request.retry_count, 1);
	}

	#[test]
	fn fresh_requests_get_distinct_fingerprints() {
		let now = datetime!(2025-03-01 09:30:00 UTC);
		let a = NotificationRequest::new(1, "x", NotificationType::MatchSuccess, now);
		let b = NotificationRequest::new(1, "x", NotificationType::MatchSuccess, now);

		assert_ne!(a, b);
	}

	#[test]
	fn match_texts_carry_count_reference_and_score() {
		let now = datetime!(2025-03-01 09:30:00 UTC);
		let summary = NotificationRequest::match_summary(&reference(), 3, now);

		assert_eq!(summary.member_id, 1);
		assert_eq!(summary.content, "match success! 3 users matched");

		let candidate = Candidate {
			matching_id: 20,
			member_id: 9,
			category: Category::Study,
			most_active_time: MostActiveTime::Morning,
			level: Level::Seed,
			age: Age::Teens,
			is_attending: false,
			introduction: "hi".to_string(),
			status: ProfileStatus::Active,
			score: 2,
		};
		let notice = NotificationRequest::match_notice(&reference(), &candidate, now);

		assert_eq!(notice.member_id, 9);
		assert!(notice.content.contains("user 1"));
		assert!(notice.content.contains("score: 2"));
	}
}
