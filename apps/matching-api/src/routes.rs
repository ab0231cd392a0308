use axum::{
	Json, Router,
	extract::{FromRequestParts, Path, Query, State, rejection::JsonRejection},
	http::{StatusCode, Uri, request::Parts},
	response::{IntoResponse, Response},
	routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use matching_domain::{Category, ParameterCode};
use matching_service::{
	CreateRequest, DeleteRequest, Error, EventStatsSnapshot, ListRequest, ProfileInput,
	ProfileResponse, UpdateInput, UpdateRequest,
};

use crate::state::AppState;

pub const MEMBER_HEADER: &str = "X-Authorization-Id";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v1/matching/save", post(save))
		.route("/api/v1/matching/check", get(check))
		.route("/api/v1/matching/update/{matching_id}", patch(update))
		.route("/api/v1/matching/delete/{matching_id}", delete(remove))
		.with_state(state)
}

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct RsData<T> {
	pub code: String,
	pub msg: String,
	pub data: Option<T>,
}
impl<T> RsData<T> {
	fn new(status: StatusCode, msg: impl Into<String>, data: T) -> Self {
		Self { code: status.as_u16().to_string(), msg: msg.into(), data: Some(data) }
	}
}

#[derive(Debug, Serialize)]
struct HealthBody {
	status: &'static str,
	fanout: EventStatsSnapshot,
}

#[derive(Debug, Deserialize)]
struct CheckQuery {
	category: Option<String>,
}

/// Caller identity taken from the `X-Authorization-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct MemberId(pub i64);
impl<S> FromRequestParts<S> for MemberId
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let member_id = parts
			.headers
			.get(MEMBER_HEADER)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.trim().parse::<i64>().ok())
			.filter(|member_id| *member_id > 0);

		match member_id {
			Some(member_id) => Ok(Self(member_id)),
			None => Err(ApiError::new(
				StatusCode::BAD_REQUEST,
				"INVALID_MEMBER_ID",
				format!("{MEMBER_HEADER} must carry a positive member id."),
				Vec::new(),
				parts.uri.path(),
			)),
		}
	}
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
	Json(HealthBody { status: "ok", fanout: state.service.events.stats() })
}

async fn save(
	State(state): State<AppState>,
	MemberId(member_id): MemberId,
	uri: Uri,
	payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<(StatusCode, Json<RsData<ProfileResponse>>), ApiError> {
	let Json(input) = payload.map_err(|rejection| ApiError::rejected(rejection, &uri))?;
	let profile = state
		.service
		.create(CreateRequest { member_id, input })
		.await
		.map_err(|err| ApiError::from_service(err, &uri))?;

	Ok((
		StatusCode::CREATED,
		Json(RsData::new(StatusCode::CREATED, "Matching profile created.", profile)),
	))
}

async fn check(
	State(state): State<AppState>,
	MemberId(member_id): MemberId,
	uri: Uri,
	Query(query): Query<CheckQuery>,
) -> Result<Json<RsData<Vec<ProfileResponse>>>, ApiError> {
	let Some(raw) = query.category.as_deref().filter(|raw| !raw.trim().is_empty()) else {
		return Err(ApiError::from_service(
			Error::InvalidParameter {
				code: ParameterCode::Category,
				message: "category query parameter is required.".to_string(),
			},
			&uri,
		));
	};
	let category =
		raw.trim().parse::<Category>().map_err(|err| ApiError::from_service(err.into(), &uri))?;
	let profiles = state
		.service
		.list(ListRequest { member_id, category: Some(category) })
		.await
		.map_err(|err| ApiError::from_service(err, &uri))?;
	let msg = if profiles.is_empty() { "No matching profiles." } else { "Matching profiles found." };

	Ok(Json(RsData::new(StatusCode::OK, msg, profiles)))
}

async fn update(
	State(state): State<AppState>,
	Path(matching_id): Path<i64>,
	uri: Uri,
	payload: Result<Json<UpdateInput>, JsonRejection>,
) -> Result<Json<RsData<ProfileResponse>>, ApiError> {
	let Json(input) = payload.map_err(|rejection| ApiError::rejected(rejection, &uri))?;
	let profile = state
		.service
		.update(UpdateRequest { matching_id, input })
		.await
		.map_err(|err| ApiError::from_service(err, &uri))?;

	Ok(Json(RsData::new(StatusCode::OK, "Matching profile updated.", profile)))
}

async fn remove(
	State(state): State<AppState>,
	MemberId(member_id): MemberId,
	Path(matching_id): Path<i64>,
	uri: Uri,
) -> Result<Json<RsData<ProfileResponse>>, ApiError> {
	let profile = state
		.service
		.delete(DeleteRequest { member_id, matching_id })
		.await
		.map_err(|err| ApiError::from_service(err, &uri))?;

	Ok(Json(RsData::new(StatusCode::OK, "Matching profile deleted.", profile)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
	status: u16,
	error_code: String,
	message: String,
	error: Vec<String>,
	path: String,
	#[serde(with = "matching_domain::time_serde")]
	timestamp: OffsetDateTime,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	errors: Vec<String>,
	path: String,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		errors: Vec<String>,
		path: impl Into<String>,
	) -> Self {
		Self {
			status,
			error_code: error_code.into(),
			message: message.into(),
			errors,
			path: path.into(),
		}
	}

	fn rejected(rejection: JsonRejection, uri: &Uri) -> Self {
		Self::from_service(Error::ValidationFailed { errors: vec![rejection.body_text()] }, uri)
	}

	fn from_service(err: Error, uri: &Uri) -> Self {
		let path = uri.path();
		let message = err.to_string();

		match err {
			Error::InvalidParameter { code, message } =>
				Self::new(StatusCode::BAD_REQUEST, code.as_str(), message.clone(), vec![message], path),
			Error::NotFound { .. } =>
				Self::new(StatusCode::NOT_FOUND, "MATCHING_NOT_FOUND", message, Vec::new(), path),
			Error::AccessDenied { .. } =>
				Self::new(StatusCode::FORBIDDEN, "ACCESS_DENIED", message, Vec::new(), path),
			Error::AlreadyDeleted { .. } =>
				Self::new(StatusCode::CONFLICT, "ALREADY_DELETED", message, Vec::new(), path),
			Error::LimitExceeded { .. } =>
				Self::new(StatusCode::CONFLICT, "MATCHING_LIMIT_EXCEEDED", message, Vec::new(), path),
			Error::ConcurrentModification { .. } => Self::new(
				StatusCode::CONFLICT,
				"OPTIMISTIC_LOCK_EXCEPTION",
				message,
				Vec::new(),
				path,
			),
			Error::ValidationFailed { errors } => Self::new(
				StatusCode::BAD_REQUEST,
				"VALIDATION_FAILED",
				"Request validation failed.",
				errors,
				path,
			),
			Error::Storage { .. } => {
				tracing::error!(path, error = %message, "Request failed with a storage error.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal server error.",
					Vec::new(),
					path,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			status: self.status.as_u16(),
			error_code: self.error_code,
			message: self.message,
			error: self.errors,
			path: self.path,
			timestamp: OffsetDateTime::now_utc(),
		};

		(self.status, Json(body)).into_response()
	}
}
