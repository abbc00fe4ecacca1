//! URL factory for the Imbo API.
//!
//! Holds the client configuration (hosts and keys) and hands out URL values
//! for each resource. Image URLs are spread over the configured hosts by
//! image identifier so the same image always lands on the same host.
//! Sending requests is left to the caller's HTTP stack.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use imbo_core::url::encode_component;
use imbo_core::{
    signed_resource_url, ClientConfig, Credentials, ImageUrl, ImagesQuery, ImboResult, ImboUrl,
};
use regex::Regex;

/// 32-character hex identifiers (either case) predate the current scheme
static LEGACY_IMAGE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)^[a-f0-9]{32}$").expect("valid regex"));

/// URL factory bound to one configuration.
#[derive(Clone, Debug)]
pub struct ImboClient {
    config: ClientConfig,
}

impl ImboClient {
    pub fn new(config: ClientConfig) -> ImboResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create client from environment: IMBO_HOSTS, IMBO_PUBLIC_KEY,
    /// IMBO_PRIVATE_KEY and optionally IMBO_USER.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Failed to load Imbo configuration")?;
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn hosts(&self) -> &[String] {
        &self.config.hosts
    }

    pub fn credentials(&self) -> &Credentials {
        &self.config.credentials
    }

    pub fn user(&self) -> &str {
        self.config.credentials.user()
    }

    fn primary_host(&self) -> &str {
        &self.config.hosts[0]
    }

    /// Pick the host serving `image_identifier`.
    ///
    /// Legacy identifiers use their first byte (two hex digits, either
    /// case); others use the code point of their last character.
    pub fn host_for_image_identifier(&self, image_identifier: &str) -> &str {
        let dec = if LEGACY_IMAGE_IDENTIFIER.is_match(image_identifier) {
            u32::from_str_radix(&image_identifier[..2], 16).unwrap_or(0)
        } else {
            image_identifier.chars().last().map(u32::from).unwrap_or(0)
        };
        let hosts = &self.config.hosts;
        &hosts[dec as usize % hosts.len()]
    }

    /// Build an ImboUrl for `path` on the primary host.
    pub fn resource_url(&self, path: &str) -> ImboResult<ImboUrl> {
        ImboUrl::new(self.primary_host(), path, self.config.credentials.clone())
    }

    /// URL of a single image, ready for transformations.
    pub fn image_url(&self, image_identifier: &str) -> ImboResult<ImageUrl> {
        let host = self.host_for_image_identifier(image_identifier);
        tracing::debug!(image_identifier, host, "Building image URL");
        ImageUrl::with_credentials(host, self.config.credentials.clone(), image_identifier)
    }

    /// URL of the image listing, with optional query parameters.
    pub fn images_url(&self, query: Option<&ImagesQuery>) -> ImboResult<ImboUrl> {
        let mut url = self.resource_url(&format!("/users/{}/images", self.user()))?;
        if let Some(query) = query {
            query.apply(&mut url);
        }
        Ok(url)
    }

    pub fn metadata_url(&self, image_identifier: &str) -> ImboResult<ImboUrl> {
        let host = self.host_for_image_identifier(image_identifier);
        ImboUrl::new(
            host,
            format!(
                "/users/{}/images/{}/metadata",
                self.user(),
                encode_component(image_identifier)
            ),
            self.config.credentials.clone(),
        )
    }

    pub fn user_url(&self) -> ImboResult<ImboUrl> {
        self.resource_url(&format!("/users/{}", self.user()))
    }

    pub fn status_url(&self) -> ImboResult<ImboUrl> {
        self.resource_url("/status")
    }

    pub fn stats_url(&self) -> ImboResult<ImboUrl> {
        self.resource_url("/stats")
    }

    /// Resource groups collection
    pub fn groups_url(&self) -> ImboResult<ImboUrl> {
        self.resource_url("/groups")
    }

    pub fn group_url(&self, group_name: &str) -> ImboResult<ImboUrl> {
        self.resource_url(&format!("/groups/{}", encode_component(group_name)))
    }

    pub fn key_url(&self, public_key: &str) -> ImboResult<ImboUrl> {
        self.resource_url(&format!("/keys/{}", encode_component(public_key)))
    }

    /// Sign `url` for a mutating request (`PUT`, `POST`, `DELETE`).
    pub fn signed_resource_url(
        &self,
        method: &str,
        url: &str,
        timestamp: &DateTime<Utc>,
    ) -> String {
        signed_resource_url(&self.config.credentials, method, url, timestamp)
    }

    /// Sign `url` with the current time.
    pub fn signed_resource_url_now(&self, method: &str, url: &str) -> String {
        self.signed_resource_url(method, url, &Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(hosts: &[&str]) -> ImboClient {
        let creds = Credentials::new("pub", "priv", None).unwrap();
        ImboClient::new(ClientConfig::new(hosts, creds).unwrap()).unwrap()
    }

    #[test]
    fn test_legacy_identifier_uses_first_byte() {
        let client = client(&["http://imbo0", "http://imbo1", "http://imbo2"]);
        // 0x61 = 97, 97 % 3 = 1
        assert_eq!(
            client.host_for_image_identifier("61da9892205a0d5077a353eb3487e8c8"),
            "http://imbo1"
        );
        // 0xff = 255, 255 % 3 = 0
        assert_eq!(
            client.host_for_image_identifier("ffda9892205a0d5077a353eb3487e8c8"),
            "http://imbo0"
        );
    }

    #[test]
    fn test_uppercase_legacy_identifier_uses_first_byte() {
        let client = client(&["http://imbo0", "http://imbo1", "http://imbo2"]);
        // 0xFF = 255 -> 0; the last char 'C' (67) would give 1
        assert_eq!(
            client.host_for_image_identifier("FFDA9892205A0D5077A353EB3487E8C8"),
            "http://imbo0"
        );
    }

    #[test]
    fn test_other_identifier_uses_last_char() {
        let client = client(&["http://imbo0", "http://imbo1"]);
        // 'a' = 97 -> 1, 'b' = 98 -> 0
        assert_eq!(client.host_for_image_identifier("some-id-a"), "http://imbo1");
        assert_eq!(client.host_for_image_identifier("some-id-b"), "http://imbo0");
    }

    #[test]
    fn test_single_host() {
        let client = client(&["imbo"]);
        assert_eq!(client.host_for_image_identifier("anything"), "http://imbo");
    }
}
