//! Access tokens and request signatures.
//!
//! Access token = hex(HMAC-SHA256(private_key, url)), computed over the
//! human-readable URL and appended as `accessToken=`.
//!
//! Request signature = hex(HMAC-SHA256(private_key, method|url|public_key|timestamp)),
//! sent with the timestamp as `signature=` and `timestamp=` on mutating calls.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn hmac_hex(private_key: &str, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(private_key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Access token for a read URL.
pub fn access_token(private_key: &str, url: &str) -> String {
    hmac_hex(private_key, url)
}

/// Signature authorizing a single mutating request.
pub fn request_signature(
    private_key: &str,
    method: &str,
    url: &str,
    public_key: &str,
    timestamp: &str,
) -> String {
    let data = format!("{}|{}|{}|{}", method, url, public_key, timestamp);
    hmac_hex(private_key, &data)
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SSZ` (UTC, second precision).
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_truncates_millis() {
        let ts = Utc.timestamp_millis_opt(1349268217123).unwrap();
        assert_eq!(format_timestamp(&ts), "2012-10-03T12:43:37Z");
    }

    #[test]
    fn test_request_signature_vector() {
        let ts = Utc.timestamp_millis_opt(1349268217000).unwrap();
        let signature = request_signature(
            "priv",
            "PUT",
            "/images/61da9892205a0d5077a353eb3487e8c8/meta",
            "pub",
            &format_timestamp(&ts),
        );
        assert_eq!(
            signature,
            "afd4c4de76a95d5ed5c23a908278cab40817012a5a5c750d971177d3cba97bf5"
        );
    }

    #[test]
    fn test_access_token_depends_on_key_and_url() {
        let url = "http://imbo/users/pub/images/61da9892205a0d5077a353eb3487e8c8";
        let token = access_token("priv", url);
        assert_eq!(token.len(), 64);
        assert_eq!(token, access_token("priv", url));
        assert_ne!(token, access_token("other", url));
        assert_ne!(token, access_token("priv", &format!("{}.png", url)));
    }
}
