use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use imbo_core::{
    ErrorMetadata, ImageFormat, ImageUrl, ImboError, ImboUrl, LogLevel, Transformation,
};
use serde::Serialize;

/// JSON shape printed for a generated URL.
#[derive(Debug, Serialize)]
pub struct UrlOutput {
    pub url: String,
    pub raw_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<Transformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

impl From<&ImageUrl> for UrlOutput {
    fn from(url: &ImageUrl) -> Self {
        Self {
            url: url.url(),
            raw_url: url.raw_url(),
            transformations: url.pipeline().to_vec(),
            format: url.extension(),
        }
    }
}

impl From<&ImboUrl> for UrlOutput {
    fn from(url: &ImboUrl) -> Self {
        Self {
            url: url.url(),
            raw_url: url.raw_url(),
            transformations: Vec::new(),
            format: None,
        }
    }
}

/// First [`ImboError`] in the error's cause chain, if any.
pub fn imbo_error(error: &anyhow::Error) -> Option<&ImboError> {
    error.chain().find_map(|cause| cause.downcast_ref::<ImboError>())
}

/// Log a failed command at the level its error asks for.
pub fn log_error(error: &anyhow::Error) {
    match imbo_error(error) {
        Some(imbo_error) => {
            let error_code = imbo_error.error_code();
            match imbo_error.log_level() {
                LogLevel::Debug => {
                    tracing::debug!(error = %error, error_code, "Command failed");
                }
                LogLevel::Warn => {
                    tracing::warn!(error = %error, error_code, "Command failed");
                }
            }
        }
        None => tracing::error!(error = %error, "Command failed"),
    }
}

/// Parse a timestamp given as RFC 3339 or as epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(millis) = value.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .with_context(|| format!("Timestamp out of range: {}", value));
    }
    let parsed = DateTime::parse_from_rfc3339(value).with_context(|| {
        format!(
            "Invalid timestamp (expected RFC 3339 or epoch millis): {}",
            value
        )
    })?;
    Ok(parsed.with_timezone(&Utc))
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use imbo_core::UrlOptions;

    #[test]
    fn parse_timestamp_epoch_millis() {
        let ts = parse_timestamp("1349268217000").unwrap();
        assert_eq!(ts.to_rfc3339(), "2012-10-03T12:43:37+00:00");
    }

    #[test]
    fn parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2012-10-03T14:43:37+02:00").unwrap();
        assert_eq!(ts.timestamp(), 1349268217);
    }

    #[test]
    fn parse_timestamp_invalid() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn url_output_lists_transformations() {
        let mut url = ImageUrl::new(UrlOptions {
            base_url: "http://imbo".to_string(),
            public_key: "pub".to_string(),
            private_key: "priv".to_string(),
            image_identifier: Some("abc".to_string()),
            ..Default::default()
        })
        .unwrap();
        url.strip().png();

        let output = UrlOutput::from(&url);
        assert_eq!(output.transformations, vec![Transformation::Strip]);
        assert_eq!(output.raw_url, "http://imbo/users/pub/images/abc.png?t[]=strip");

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["transformations"][0], "strip");
        assert_eq!(json["format"], "png");
    }

    #[test]
    fn url_output_for_resource_omits_empty_fields() {
        let credentials = imbo_core::Credentials::new("pub", "priv", None).unwrap();
        let mut url = ImboUrl::new("http://imbo", "/status", credentials).unwrap();
        url.set_access_token(false);

        let json = serde_json::to_value(UrlOutput::from(&url)).unwrap();
        assert_eq!(json["url"], "http://imbo/status");
        assert!(json.get("transformations").is_none());
        assert!(json.get("format").is_none());
    }

    #[test]
    fn imbo_error_found_through_context() {
        let error = anyhow::Error::new(ImboError::invalid_argument("angle must be numeric"))
            .context("Failed to build URL");
        let found = imbo_error(&error).unwrap();
        assert_eq!(found.error_code(), "INVALID_ARGUMENT");
        assert_eq!(found.log_level(), LogLevel::Debug);

        let other = anyhow::anyhow!("network down");
        assert!(imbo_error(&other).is_none());
    }
}
