//! Connection-string parsing and SAS token generation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors from IoT Hub client construction.
#[derive(Debug, Error)]
pub enum IotError {
    /// The device connection string is malformed or incomplete.
    #[error("invalid connection string: {0}")]
    ConnectionString(String),

    /// The shared access key is not valid base64.
    #[error("invalid shared access key: {0}")]
    Key(#[from] base64::DecodeError),
}

/// Parsed `HostName=...;DeviceId=...;SharedAccessKey=...` parts.
#[derive(Debug, Clone)]
pub struct ConnectionString {
    pub host_name: String,
    pub device_id: String,
    pub shared_access_key: String,
}

impl ConnectionString {
    /// Parse a device connection string, reporting every missing part.
    pub fn parse(raw: &str) -> Result<Self, IotError> {
        let mut host_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for pair in raw.split(';').filter(|p| !p.is_empty()) {
            let Some((name, value)) = pair.split_once('=') else {
                return Err(IotError::ConnectionString(format!(
                    "expected name=value pairs, got '{pair}'"
                )));
            };
            match name {
                "HostName" => host_name = Some(value.to_string()),
                // SharedAccessKey is base64 and may itself end in '='; the
                // split above only takes the first one.
                "SharedAccessKey" => shared_access_key = Some(value.to_string()),
                "DeviceId" => device_id = Some(value.to_string()),
                _ => {}
            }
        }

        let mut missing = Vec::new();
        if host_name.is_none() {
            missing.push("HostName");
        }
        if device_id.is_none() {
            missing.push("DeviceId");
        }
        if shared_access_key.is_none() {
            missing.push("SharedAccessKey");
        }
        if !missing.is_empty() {
            return Err(IotError::ConnectionString(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            host_name: host_name.unwrap(),
            device_id: device_id.unwrap(),
            shared_access_key: shared_access_key.unwrap(),
        })
    }

    /// The resource this device signs tokens for.
    pub fn resource_uri(&self) -> String {
        format!("{}/devices/{}", self.host_name, self.device_id)
    }
}

/// Build a `SharedAccessSignature` token for `resource_uri` expiring at
/// `expiry` (unix seconds).
pub fn sas_token(key: &[u8], resource_uri: &str, expiry: i64) -> String {
    let encoded_uri = urlencoding::encode(resource_uri).into_owned();
    let to_sign = format!("{encoded_uri}\n{expiry}");

    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(to_sign.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    format!(
        "SharedAccessSignature sr={encoded_uri}&sig={}&se={expiry}",
        urlencoding::encode(&signature)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONN: &str =
        "HostName=addipi-hub.azure-devices.net;DeviceId=printer-1;SharedAccessKey=c2VjcmV0LWtleQ==";

    #[test]
    fn test_parse_full_connection_string() {
        let parsed = ConnectionString::parse(CONN).unwrap();
        assert_eq!(parsed.host_name, "addipi-hub.azure-devices.net");
        assert_eq!(parsed.device_id, "printer-1");
        assert_eq!(parsed.shared_access_key, "c2VjcmV0LWtleQ==");
        assert_eq!(
            parsed.resource_uri(),
            "addipi-hub.azure-devices.net/devices/printer-1"
        );
    }

    #[test]
    fn test_parse_keeps_key_padding() {
        // The '=' padding after the first separator belongs to the value.
        let parsed = ConnectionString::parse(CONN).unwrap();
        assert!(parsed.shared_access_key.ends_with("=="));
    }

    #[test]
    fn test_parse_names_every_missing_part() {
        let err = ConnectionString::parse("HostName=h.azure-devices.net").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("DeviceId"));
        assert!(message.contains("SharedAccessKey"));
        assert!(!message.contains("HostName"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ConnectionString::parse("no separators here").is_err());
    }

    #[test]
    fn test_sas_token_shape() {
        let token = sas_token(b"secret-key", "addipi-hub.azure-devices.net/devices/printer-1", 1_700_000_000);

        assert!(token.starts_with("SharedAccessSignature sr="));
        assert!(token.contains("&sig="));
        assert!(token.ends_with("&se=1700000000"));
        // The resource URI slash must be encoded inside the token.
        assert!(token.contains("addipi-hub.azure-devices.net%2Fdevices%2Fprinter-1"));
    }

    #[test]
    fn test_sas_token_is_deterministic_per_expiry() {
        let uri = "h/devices/d";
        assert_eq!(sas_token(b"k", uri, 100), sas_token(b"k", uri, 100));
        assert_ne!(sas_token(b"k", uri, 100), sas_token(b"k", uri, 101));
    }
}
