//! Startup configuration.

use std::time::Duration;

use thiserror::Error;

/// Configuration errors, fatal before the loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required values were absent. Every missing name is
    /// reported in one diagnostic so the operator fixes them all at once.
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Validated service configuration.
#[derive(Debug)]
pub struct Config {
    pub iot_conn_string: String,
    pub cosmos_endpoint: String,
    pub cosmos_key: String,
    pub port: u16,
    pub poll_interval: Duration,
}

impl Config {
    /// Validate the raw CLI/environment values, collecting all missing
    /// required names before failing.
    pub fn new(
        iot_conn_string: Option<String>,
        cosmos_endpoint: Option<String>,
        cosmos_key: Option<String>,
        port: u16,
        poll_interval_secs: u64,
    ) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        if iot_conn_string.as_deref().is_none_or(str::is_empty) {
            missing.push("IOT_CONN_STRING");
        }
        if cosmos_endpoint.as_deref().is_none_or(str::is_empty) {
            missing.push("COSMOS_ENDPOINT");
        }
        if cosmos_key.as_deref().is_none_or(str::is_empty) {
            missing.push("COSMOS_KEY");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            iot_conn_string: iot_conn_string.unwrap(),
            cosmos_endpoint: cosmos_endpoint.unwrap(),
            cosmos_key: cosmos_key.unwrap(),
            port,
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> (Option<String>, Option<String>, Option<String>) {
        (
            Some("HostName=h;DeviceId=d;SharedAccessKey=k".to_string()),
            Some("https://acct.documents.azure.com:443/".to_string()),
            Some("key".to_string()),
        )
    }

    #[test]
    fn test_accepts_complete_configuration() {
        let (iot, endpoint, key) = full();
        let config = Config::new(iot, endpoint, key, 3050, 60).unwrap();
        assert_eq!(config.port, 3050);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_reports_single_missing_value() {
        let (iot, _, key) = full();
        let err = Config::new(iot, None, key, 3050, 60).unwrap_err();
        assert_eq!(err.to_string(), "missing required environment variables: COSMOS_ENDPOINT");
    }

    #[test]
    fn test_reports_every_missing_value_at_once() {
        let err = Config::new(None, None, None, 3050, 60).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("IOT_CONN_STRING"));
        assert!(message.contains("COSMOS_ENDPOINT"));
        assert!(message.contains("COSMOS_KEY"));
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let (iot, endpoint, _) = full();
        let err = Config::new(iot, endpoint, Some(String::new()), 3050, 60).unwrap_err();
        assert!(err.to_string().contains("COSMOS_KEY"));
    }
}
