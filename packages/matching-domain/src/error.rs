use crate::ParameterCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Invalid parameter ({code}): {message}")]
	InvalidParameter { code: ParameterCode, message: String },
	#[error("Member {member_id} may not modify matching profile {matching_id}.")]
	AccessDenied { matching_id: i64, member_id: i64 },
	#[error("Matching profile {matching_id} is already deleted.")]
	AlreadyDeleted { matching_id: i64 },
}
impl Error {
	pub fn invalid(code: ParameterCode, message: impl Into<String>) -> Self {
		Self::InvalidParameter { code, message: message.into() }
	}
}
