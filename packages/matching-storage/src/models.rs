use time::OffsetDateTime;

use matching_domain::{Candidate, Profile, ProfileRecord, matching};

use crate::Result;

#[derive(Debug, sqlx::FromRow)]
pub struct ProfileRow {
	pub matching_id: i64,
	pub member_id: i64,
	pub category: String,
	pub most_active_time: String,
	pub level: String,
	pub age: String,
	pub is_attending: bool,
	pub introduction: String,
	pub status: String,
	pub version: i64,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl ProfileRow {
	pub fn into_profile(self) -> Result<Profile> {
		let record = ProfileRecord {
			matching_id: self.matching_id,
			member_id: self.member_id,
			category: self.category.parse()?,
			most_active_time: self.most_active_time.parse()?,
			level: self.level.parse()?,
			age: self.age.parse()?,
			is_attending: self.is_attending,
			introduction: self.introduction,
			status: self.status.parse()?,
			version: self.version,
			created_at: self.created_at,
			updated_at: self.updated_at,
		};

		Ok(Profile::restore(record)?)
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CandidateRow {
	pub matching_id: i64,
	pub member_id: i64,
	pub category: String,
	pub most_active_time: String,
	pub level: String,
	pub age: String,
	pub is_attending: bool,
	pub introduction: String,
	pub status: String,
	pub score: i32,
}
impl CandidateRow {
	pub fn into_candidate(self) -> Result<Candidate> {
		let score = self.score.clamp(0, i32::from(matching::MAX_SCORE)) as u8;

		Ok(Candidate {
			matching_id: self.matching_id,
			member_id: self.member_id,
			category: self.category.parse()?,
			most_active_time: self.most_active_time.parse()?,
			level: self.level.parse()?,
			age: self.age.parse()?,
			is_attending: self.is_attending,
			introduction: self.introduction,
			status: self.status.parse()?,
			score,
		})
	}
}
