use time::OffsetDateTime;

use crate::{MatchingService, ProfileResponse, Result};

#[derive(Clone, Debug)]
pub struct DeleteRequest {
	pub member_id: i64,
	pub matching_id: i64,
}

impl MatchingService {
	/// Soft delete by the owner. No match notifications follow a delete.
	pub async fn delete(&self, req: DeleteRequest) -> Result<ProfileResponse> {
		let mut profile = self.load(crate::update::validate_matching_id(req.matching_id)?).await?;

		profile.delete(req.member_id)?;

		let saved = self.store.update(&profile, OffsetDateTime::now_utc()).await?;

		tracing::info!(
			matching_id = saved.matching_id(),
			member_id = saved.member_id(),
			"Matching profile deleted."
		);

		Ok(ProfileResponse::from(&saved))
	}
}
