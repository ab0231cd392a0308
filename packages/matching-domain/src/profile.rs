use time::OffsetDateTime;

use crate::{
	Age, Category, Error, Level, MostActiveTime, ParameterCode, Patch, ProfileStatus,
	QueryProjection, Result,
};

pub const MAX_INTRODUCTION_CHARS: usize = 1_000;

/// Unvalidated creation input, as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
	pub member_id: i64,
	pub category: Option<Category>,
	pub most_active_time: Option<MostActiveTime>,
	pub level: Option<Level>,
	pub age: Option<Age>,
	pub is_attending: Option<bool>,
	pub introduction: Option<String>,
}

/// A validated profile that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
	member_id: i64,
	category: Category,
	most_active_time: MostActiveTime,
	level: Level,
	age: Age,
	is_attending: bool,
	introduction: String,
}
impl NewProfile {
	pub fn create(draft: ProfileDraft) -> Result<Self> {
		let introduction = validate_introduction(draft.introduction.as_deref())?;
		let member_id = validate_member_id(draft.member_id)?;
		let category = require(draft.category, ParameterCode::Category, "category")?;
		let most_active_time =
			require(draft.most_active_time, ParameterCode::MostActiveTime, "mostActiveTime")?;
		let level = require(draft.level, ParameterCode::Level, "level")?;
		let age = require(draft.age, ParameterCode::Age, "age")?;
		let is_attending = require(draft.is_attending, ParameterCode::IsAttending, "isAttending")?;

		Ok(Self {
			member_id,
			category,
			most_active_time,
			level,
			age,
			is_attending,
			introduction,
		})
	}

	pub fn member_id(&self) -> i64 {
		self.member_id
	}

	pub fn category(&self) -> Category {
		self.category
	}

	pub fn most_active_time(&self) -> MostActiveTime {
		self.most_active_time
	}

	pub fn level(&self) -> Level {
		self.level
	}

	pub fn age(&self) -> Age {
		self.age
	}

	pub fn is_attending(&self) -> bool {
		self.is_attending
	}

	pub fn introduction(&self) -> &str {
		&self.introduction
	}
}

/// A row as it comes back from storage, before re-validation.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
	pub matching_id: i64,
	pub member_id: i64,
	pub category: Category,
	pub most_active_time: MostActiveTime,
	pub level: Level,
	pub age: Age,
	pub is_attending: bool,
	pub introduction: String,
	pub status: ProfileStatus,
	pub version: i64,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// Field changes requested by a partial update. Category and owner are fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
	pub most_active_time: Patch<MostActiveTime>,
	pub level: Patch<Level>,
	pub age: Patch<Age>,
	pub is_attending: Patch<bool>,
	pub introduction: Patch<String>,
}
impl ProfileUpdate {
	pub fn is_empty(&self) -> bool {
		self.most_active_time.is_absent()
			&& self.level.is_absent()
			&& self.age.is_absent()
			&& self.is_attending.is_absent()
			&& self.introduction.is_absent()
	}
}

/// A persisted profile. Every mutation goes through a validating method and a deleted profile
/// rejects all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
	matching_id: i64,
	member_id: i64,
	category: Category,
	most_active_time: MostActiveTime,
	level: Level,
	age: Age,
	is_attending: bool,
	introduction: String,
	status: ProfileStatus,
	version: i64,
	created_at: OffsetDateTime,
	updated_at: OffsetDateTime,
}
impl Profile {
	pub fn restore(record: ProfileRecord) -> Result<Self> {
		if record.matching_id <= 0 {
			return Err(Error::invalid(
				ParameterCode::MatchingId,
				format!("Stored matching id {} is not positive.", record.matching_id),
			));
		}

		validate_member_id(record.member_id)?;

		Ok(Self {
			matching_id: record.matching_id,
			member_id: record.member_id,
			category: record.category,
			most_active_time: record.most_active_time,
			level: record.level,
			age: record.age,
			is_attending: record.is_attending,
			introduction: record.introduction,
			status: record.status,
			version: record.version,
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}

	pub fn matching_id(&self) -> i64 {
		self.matching_id
	}

	pub fn member_id(&self) -> i64 {
		self.member_id
	}

	pub fn category(&self) -> Category {
		self.category
	}

	pub fn most_active_time(&self) -> MostActiveTime {
		self.most_active_time
	}

	pub fn level(&self) -> Level {
		self.level
	}

	pub fn age(&self) -> Age {
		self.age
	}

	pub fn is_attending(&self) -> bool {
		self.is_attending
	}

	pub fn introduction(&self) -> &str {
		&self.introduction
	}

	pub fn status(&self) -> ProfileStatus {
		self.status
	}

	pub fn is_active(&self) -> bool {
		self.status == ProfileStatus::Active
	}

	pub fn version(&self) -> i64 {
		self.version
	}

	pub fn created_at(&self) -> OffsetDateTime {
		self.created_at
	}

	pub fn updated_at(&self) -> OffsetDateTime {
		self.updated_at
	}

	pub fn projection(&self) -> QueryProjection {
		QueryProjection {
			member_id: self.member_id,
			category: self.category,
			most_active_time: self.most_active_time,
			level: self.level,
			age: self.age,
			is_attending: self.is_attending,
		}
	}

	pub fn update_most_active_time(&mut self, value: Option<MostActiveTime>) -> Result<()> {
		self.ensure_active()?;

		self.most_active_time = require(value, ParameterCode::MostActiveTime, "mostActiveTime")?;

		Ok(())
	}

	pub fn update_level(&mut self, value: Option<Level>) -> Result<()> {
		self.ensure_active()?;

		self.level = require(value, ParameterCode::Level, "level")?;

		Ok(())
	}

	pub fn update_age(&mut self, value: Option<Age>) -> Result<()> {
		self.ensure_active()?;

		self.age = require(value, ParameterCode::Age, "age")?;

		Ok(())
	}

	pub fn update_attendance(&mut self, value: Option<bool>) -> Result<()> {
		self.ensure_active()?;

		self.is_attending = require(value, ParameterCode::IsAttending, "isAttending")?;

		Ok(())
	}

	pub fn update_introduction(&mut self, value: Option<&str>) -> Result<()> {
		self.ensure_active()?;

		self.introduction = validate_introduction(value)?;

		Ok(())
	}

	/// Applies every present field of `update`, stopping at the first invalid one.
	pub fn apply(&mut self, update: ProfileUpdate) -> Result<()> {
		self.ensure_active()?;

		if let Some(value) = update.most_active_time.into_change() {
			self.update_most_active_time(value)?;
		}
		if let Some(value) = update.level.into_change() {
			self.update_level(value)?;
		}
		if let Some(value) = update.age.into_change() {
			self.update_age(value)?;
		}
		if let Some(value) = update.is_attending.into_change() {
			self.update_attendance(value)?;
		}
		if let Some(value) = update.introduction.into_change() {
			self.update_introduction(value.as_deref())?;
		}

		Ok(())
	}

	/// Soft delete. Only the owner may delete, and only once.
	pub fn delete(&mut self, member_id: i64) -> Result<()> {
		if self.member_id != member_id {
			return Err(Error::AccessDenied { matching_id: self.matching_id, member_id });
		}

		self.ensure_active()?;

		self.status = ProfileStatus::Deleted;

		Ok(())
	}

	fn ensure_active(&self) -> Result<()> {
		if self.status == ProfileStatus::Deleted {
			return Err(Error::AlreadyDeleted { matching_id: self.matching_id });
		}

		Ok(())
	}
}

pub fn validate_member_id(member_id: i64) -> Result<i64> {
	if member_id <= 0 {
		return Err(Error::invalid(
			ParameterCode::MemberId,
			format!("Member id must be positive, got {member_id}."),
		));
	}

	Ok(member_id)
}

/// Trims and bounds the introduction. Returns the trimmed text.
pub fn validate_introduction(introduction: Option<&str>) -> Result<String> {
	let Some(trimmed) = introduction.map(str::trim).filter(|text| !text.is_empty()) else {
		return Err(Error::invalid(ParameterCode::Introduction, "Introduction must not be blank."));
	};

	if trimmed.chars().count() > MAX_INTRODUCTION_CHARS {
		return Err(Error::invalid(
			ParameterCode::Introduction,
			format!("Introduction must be at most {MAX_INTRODUCTION_CHARS} characters."),
		));
	}

	Ok(trimmed.to_string())
}

fn require<T>(value: Option<T>, code: ParameterCode, field: &str) -> Result<T> {
	value.ok_or_else(|| Error::invalid(code, format!("{field} is required.")))
}
