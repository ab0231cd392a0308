pub type Result<T, E = SinkError> = std::result::Result<T, E>;

/// Why a delivery attempt to the notification service failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
	#[error("Notification service responded with status {0}.")]
	Status(u16),
	#[error("Notification service did not respond in time.")]
	Timeout,
	#[error("Failed to connect to the notification service: {0}")]
	Connect(String),
	#[error("Notification request failed: {0}")]
	Other(String),
}
impl SinkError {
	/// 5xx, 408, 429, timeouts and connect failures are worth another attempt. Other statuses are
	/// final.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Status(status) => *status >= 500 || *status == 408 || *status == 429,
			Self::Timeout | Self::Connect(_) => true,
			Self::Other(_) => false,
		}
	}

	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status(status) => Some(*status),
			_ => None,
		}
	}

	pub fn is_service_unavailable(&self) -> bool {
		self.status() == Some(503)
	}

	/// Short label for logs.
	pub fn class(&self) -> &'static str {
		match self {
			Self::Status(503) => "service_unavailable",
			Self::Status(status) if *status >= 500 => "server_error",
			Self::Status(_) => "client_error",
			Self::Timeout => "timeout",
			Self::Connect(_) => "connect",
			Self::Other(_) => "other",
		}
	}
}
impl From<reqwest::Error> for SinkError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Self::Timeout
		} else if err.is_connect() {
			Self::Connect(err.to_string())
		} else if let Some(status) = err.status() {
			Self::Status(status.as_u16())
		} else {
			Self::Other(err.to_string())
		}
	}
}
