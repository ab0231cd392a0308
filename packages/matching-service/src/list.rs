use matching_domain::{Category, profile};

use crate::{MatchingService, ProfileResponse, Result};

#[derive(Clone, Debug)]
pub struct ListRequest {
	pub member_id: i64,
	/// Restricts the listing to one category.
	pub category: Option<Category>,
}

impl MatchingService {
	/// The caller's own profiles, newest first, deleted ones included.
	pub async fn list(&self, req: ListRequest) -> Result<Vec<ProfileResponse>> {
		let member_id = profile::validate_member_id(req.member_id)?;
		let profiles = match req.category {
			Some(category) => self.store.list_by_category_and_member(category, member_id).await?,
			None => self.store.list_by_member(member_id).await?,
		};

		if profiles.is_empty() {
			tracing::info!(member_id, category = ?req.category, "Member has no matching profiles.");
		} else {
			tracing::info!(
				member_id,
				category = ?req.category,
				count = profiles.len(),
				"Listed matching profiles."
			);
		}

		Ok(profiles.iter().map(ProfileResponse::from).collect())
	}
}
