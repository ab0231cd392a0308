use std::str::FromStr;

use serde::Deserialize;
use time::OffsetDateTime;

use matching_domain::{ParameterCode, Patch, ProfileUpdate};

use crate::{Error, MatchingService, ProfileResponse, Result};

/// Partial update body. Missing keys leave the stored value alone; explicit `null` is validated
/// like any other value and rejected for required fields.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateInput {
	pub most_active_time: Patch<String>,
	pub level: Patch<String>,
	pub age: Patch<String>,
	pub is_attending: Patch<bool>,
	pub introduction: Patch<String>,
	/// Version the caller last read. A stale value fails with a concurrent-modification error.
	pub version: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct UpdateRequest {
	pub matching_id: i64,
	pub input: UpdateInput,
}

impl MatchingService {
	pub async fn update(&self, req: UpdateRequest) -> Result<ProfileResponse> {
		let matching_id = validate_matching_id(req.matching_id)?;
		let UpdateInput { most_active_time, level, age, is_attending, introduction, version } =
			req.input;
		let update = ProfileUpdate {
			most_active_time: parse_patch(most_active_time)?,
			level: parse_patch(level)?,
			age: parse_patch(age)?,
			is_attending,
			introduction,
		};
		let mut profile = self.load(matching_id).await?;

		if version.is_some_and(|version| version != profile.version()) {
			return Err(Error::ConcurrentModification { matching_id });
		}

		let empty = update.is_empty();

		profile.apply(update)?;

		if empty {
			return Ok(ProfileResponse::from(&profile));
		}

		let saved = self.store.update(&profile, OffsetDateTime::now_utc()).await?;

		tracing::info!(
			matching_id = saved.matching_id(),
			member_id = saved.member_id(),
			version = saved.version(),
			"Matching profile updated."
		);

		self.announce(&saved);

		Ok(ProfileResponse::from(&saved))
	}
}

pub(crate) fn validate_matching_id(matching_id: i64) -> Result<i64> {
	if matching_id <= 0 {
		return Err(Error::InvalidParameter {
			code: ParameterCode::MatchingId,
			message: format!("Matching id must be positive, got {matching_id}."),
		});
	}

	Ok(matching_id)
}

fn parse_patch<T>(patch: Patch<String>) -> Result<Patch<T>>
where
	T: FromStr<Err = matching_domain::Error>,
{
	Ok(match patch {
		Patch::Absent => Patch::Absent,
		Patch::Null => Patch::Null,
		Patch::Value(raw) => Patch::Value(raw.trim().parse()?),
	})
}
