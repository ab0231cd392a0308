use std::str::FromStr;

use serde::Deserialize;
use time::OffsetDateTime;

use matching_domain::{NewProfile, ProfileDraft};

use crate::{MatchingService, ProfileResponse, Result};

/// Creation body. Enum values arrive as their upper-case names.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
	pub category: Option<String>,
	pub most_active_time: Option<String>,
	pub level: Option<String>,
	pub age: Option<String>,
	pub is_attending: Option<bool>,
	pub introduction: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CreateRequest {
	pub member_id: i64,
	pub input: ProfileInput,
}

impl MatchingService {
	pub async fn create(&self, req: CreateRequest) -> Result<ProfileResponse> {
		let CreateRequest { member_id, input } = req;
		let draft = ProfileDraft {
			member_id,
			category: parse(input.category.as_deref())?,
			most_active_time: parse(input.most_active_time.as_deref())?,
			level: parse(input.level.as_deref())?,
			age: parse(input.age.as_deref())?,
			is_attending: input.is_attending,
			introduction: input.introduction,
		};
		let profile = NewProfile::create(draft)?;
		let saved = self
			.store
			.insert(&profile, self.cfg.matching.max_active_per_category, OffsetDateTime::now_utc())
			.await?;

		tracing::info!(
			matching_id = saved.matching_id(),
			member_id = saved.member_id(),
			category = saved.category().as_str(),
			"Matching profile created."
		);

		self.announce(&saved);

		Ok(ProfileResponse::from(&saved))
	}
}

pub(crate) fn parse<T>(raw: Option<&str>) -> Result<Option<T>>
where
	T: FromStr<Err = matching_domain::Error>,
{
	Ok(raw.map(|raw| raw.trim().parse()).transpose()?)
}
