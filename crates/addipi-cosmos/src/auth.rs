//! Master-key request signing for the Cosmos DB REST API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// A decoded Cosmos master key.
#[derive(Clone)]
pub struct MasterKey {
    key: Vec<u8>,
}

impl MasterKey {
    /// Decode the base64 account key.
    pub fn new(key: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self {
            key: BASE64.decode(key)?,
        })
    }

    /// Build the `Authorization` header value for one request.
    ///
    /// Signs `{verb}\n{resource_type}\n{resource_link}\n{date}\n\n` with the
    /// verb and date lowercased, then percent-encodes the
    /// `type=master&ver=1.0&sig=...` token.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type,
            resource_link,
            date.to_lowercase()
        );

        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        urlencoding::encode(&format!("type=master&ver=1.0&sig={signature}")).into_owned()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey").finish_non_exhaustive()
    }
}

/// RFC 1123 timestamp for the `x-ms-date` header.
pub fn rfc1123_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> MasterKey {
        // Any valid base64 works; signatures just have to be deterministic.
        MasterKey::new(&BASE64.encode(b"addipi-test-master-key")).unwrap()
    }

    #[test]
    fn test_rejects_invalid_base64_key() {
        assert!(MasterKey::new("not base64!!").is_err());
    }

    #[test]
    fn test_rfc1123_date_format() {
        let date = rfc1123_date("2024-01-01T00:01:00Z".parse().unwrap());
        assert_eq!(date, "Mon, 01 Jan 2024 00:01:00 GMT");
    }

    #[test]
    fn test_authorization_is_deterministic() {
        let key = test_key();
        let date = "Mon, 01 Jan 2024 00:01:00 GMT";

        let a = key.authorization("POST", "docs", "dbs/addipi/colls/jobs", date);
        let b = key.authorization("POST", "docs", "dbs/addipi/colls/jobs", date);
        assert_eq!(a, b);
    }

    #[test]
    fn test_authorization_token_is_percent_encoded() {
        let key = test_key();
        let token = key.authorization(
            "GET",
            "docs",
            "dbs/addipi/colls/jobs/docs/j1",
            "Mon, 01 Jan 2024 00:01:00 GMT",
        );

        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        // Base64 padding and symbols must not survive unencoded.
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn test_authorization_varies_with_inputs() {
        let key = test_key();
        let date = "Mon, 01 Jan 2024 00:01:00 GMT";

        let query = key.authorization("POST", "docs", "dbs/addipi/colls/jobs", date);
        let replace = key.authorization("PUT", "docs", "dbs/addipi/colls/jobs/docs/j1", date);
        assert_ne!(query, replace);
    }

    #[test]
    fn test_verb_case_does_not_change_signature() {
        let key = test_key();
        let date = "Mon, 01 Jan 2024 00:01:00 GMT";

        let upper = key.authorization("PUT", "docs", "dbs/addipi/colls/jobs/docs/j1", date);
        let lower = key.authorization("put", "docs", "dbs/addipi/colls/jobs/docs/j1", date);
        assert_eq!(upper, lower);
    }
}
