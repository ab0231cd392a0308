use matching_domain::ParameterCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid parameter ({code}): {message}")]
	InvalidParameter { code: ParameterCode, message: String },
	#[error("Matching profile {matching_id} not found.")]
	NotFound { matching_id: i64 },
	#[error("Member {member_id} may not modify matching profile {matching_id}.")]
	AccessDenied { matching_id: i64, member_id: i64 },
	#[error("Matching profile {matching_id} is already deleted.")]
	AlreadyDeleted { matching_id: i64 },
	#[error("Member {member_id} already has {limit} active {category} profiles.")]
	LimitExceeded { member_id: i64, category: String, limit: u32 },
	#[error("Matching profile {matching_id} was modified concurrently.")]
	ConcurrentModification { matching_id: i64 },
	#[error("Validation failed: {}", errors.join("; "))]
	ValidationFailed { errors: Vec<String> },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<matching_domain::Error> for Error {
	fn from(err: matching_domain::Error) -> Self {
		match err {
			matching_domain::Error::InvalidParameter { code, message } =>
				Self::InvalidParameter { code, message },
			matching_domain::Error::AccessDenied { matching_id, member_id } =>
				Self::AccessDenied { matching_id, member_id },
			matching_domain::Error::AlreadyDeleted { matching_id } =>
				Self::AlreadyDeleted { matching_id },
		}
	}
}

impl From<matching_storage::Error> for Error {
	fn from(err: matching_storage::Error) -> Self {
		match err {
			matching_storage::Error::LimitExceeded { member_id, category, limit } =>
				Self::LimitExceeded { member_id, category, limit },
			matching_storage::Error::VersionConflict { matching_id, .. } =>
				Self::ConcurrentModification { matching_id },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
