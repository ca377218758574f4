//! HTTPS device-to-cloud event client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use addipi_scheduler::{DispatchError, SignalDispatcher};

use crate::sas::{ConnectionString, IotError, sas_token};

const API_VERSION: &str = "2021-04-12";

/// Lifetime of each per-request SAS token.
const SAS_TTL_SECS: i64 = 3600;

/// Start-signal dispatcher backed by an Azure IoT Hub device endpoint.
#[derive(Debug)]
pub struct IotHubDispatcher {
    http: Client,
    endpoint: String,
    device_id: String,
    resource_uri: String,
    key: Vec<u8>,
}

impl IotHubDispatcher {
    /// Build a dispatcher from a device connection string
    /// (`HostName=...;DeviceId=...;SharedAccessKey=...`).
    pub fn from_connection_string(raw: &str) -> Result<Self, IotError> {
        let parsed = ConnectionString::parse(raw)?;
        let key = BASE64.decode(&parsed.shared_access_key)?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Ok(Self {
            http,
            endpoint: format!("https://{}", parsed.host_name),
            resource_uri: parsed.resource_uri(),
            device_id: parsed.device_id,
            key,
        })
    }

    /// Override the hub endpoint, e.g. for a local emulator.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self) -> String {
        format!(
            "{}/devices/{}/messages/events?api-version={}",
            self.endpoint, self.device_id, API_VERSION
        )
    }
}

#[async_trait]
impl SignalDispatcher for IotHubDispatcher {
    async fn send_start_signal(&self, file_id: &str) -> Result<(), DispatchError> {
        let expiry = Utc::now().timestamp() + SAS_TTL_SECS;
        let token = sas_token(&self.key, &self.resource_uri, expiry);

        let response = self
            .http
            .post(self.events_url())
            .header("Authorization", token)
            .json(&json!({ "event": "print_start", "fileId": file_id }))
            .send()
            .await
            .map_err(|e| DispatchError::Delivery(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(file_id, device_id = %self.device_id, "start signal handed off");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DispatchError::Auth(format!("{status}: {body}")))
            }
            _ => Err(DispatchError::Delivery(format!("{status}: {body}"))),
        }
    }
}
