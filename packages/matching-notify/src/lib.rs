mod error;

pub use error::{Result, SinkError};

use std::time::Duration;

use reqwest::Client;

use matching_domain::NotificationRequest;

/// Client for `POST {service_url}/notifications`.
#[derive(Clone)]
pub struct HttpNotificationSink {
	client: Client,
	endpoint: String,
}
impl HttpNotificationSink {
	pub fn new(cfg: &matching_config::Notification) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()
			.map_err(|err| SinkError::Other(err.to_string()))?;
		let endpoint = format!("{}/notifications", cfg.service_url.trim_end_matches('/'));

		Ok(Self { client, endpoint })
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	/// One delivery attempt. Any 2xx is success.
	pub async fn send(&self, request: &NotificationRequest) -> Result<()> {
		let res = self.client.post(&self.endpoint).json(request).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(SinkError::Status(status.as_u16()));
		}

		tracing::debug!(
			member_id = request.member_id,
			uuid = %request.uuid(),
			status = status.as_u16(),
			"Notification delivered."
		);

		Ok(())
	}
}
