//! URL assembly and signing
//!
//! [`ImboUrl`] is a resource URL on an Imbo host: base URL, path, opaque
//! passthrough query string and structured query parameters. Rendering it
//! produces the canonical query string and, unless disabled, appends an
//! access token. [`ImageUrl`] builds on it with the transformation pipeline.
//!
//! Query parameter order is fixed:
//! `[existing] [t[] entries] [publicKey] [accessToken | signature&timestamp]`.

mod image;
mod query;

pub use image::ImageUrl;
pub use query::ImagesQuery;

use std::fmt;

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::{normalize_host, Credentials};
use crate::error::{ImboError, ImboResult};
use crate::signer;

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, matching URL component
/// encoding as the service decodes it.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single query component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

fn query_pair(key: &str, value: &str, encode: bool) -> String {
    if encode {
        format!("{}={}", encode_component(key), encode_component(value))
    } else {
        format!("{}={}", key, value)
    }
}

/// Encode an opaque `k=v&k=v` string pair by pair. Input is taken as
/// unencoded text; `&` and the first `=` of each pair stay literal.
fn encode_query_string(query_string: &str) -> String {
    query_string
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => query_pair(key, value, true),
            None => encode_component(pair),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn compose(base_url: &str, path: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{}{}", base_url, path)
    } else {
        format!("{}{}?{}", base_url, path, query)
    }
}

fn append_param(url: &str, key: &str, value: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", url, sep, key, value)
}

/// Options accepted when constructing a URL directly (without a client).
#[derive(Clone, Default)]
pub struct UrlOptions {
    pub base_url: String,
    pub public_key: String,
    /// Used for signing only; never part of the output
    pub private_key: String,
    /// Defaults to the public key
    pub user: Option<String>,
    /// Required for image URLs
    pub image_identifier: Option<String>,
    /// Opaque query string placed first; encoded pair by pair in `url()`
    pub query_string: Option<String>,
}

/// A resource URL on an Imbo host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImboUrl {
    base_url: String,
    path: String,
    credentials: Credentials,
    query_string: Option<String>,
    query_params: Vec<(String, String)>,
    access_token: bool,
}

impl ImboUrl {
    /// Create a URL for `path` (starting with `/`) on `base_url`.
    pub fn new(
        base_url: &str,
        path: impl Into<String>,
        credentials: Credentials,
    ) -> ImboResult<Self> {
        if base_url.trim().is_empty() {
            return Err(ImboError::invalid_configuration(
                "base URL must not be empty",
            ));
        }

        Ok(Self {
            base_url: normalize_host(base_url)?,
            path: path.into(),
            credentials,
            query_string: None,
            query_params: Vec::new(),
            access_token: true,
        })
    }

    /// Create a URL from construction options. `path` is relative to the base URL.
    pub fn from_options(options: UrlOptions, path: impl Into<String>) -> ImboResult<Self> {
        let credentials = Credentials::new(options.public_key, options.private_key, options.user)?;
        let mut url = Self::new(&options.base_url, path, credentials)?;
        url.query_string = options.query_string;
        Ok(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn user(&self) -> &str {
        self.credentials.user()
    }

    pub fn public_key(&self) -> &str {
        self.credentials.public_key()
    }

    /// Set the opaque passthrough query string (a leading `?` is ignored).
    pub fn set_query_string(&mut self, query_string: &str) -> &mut Self {
        let trimmed = query_string.trim_start_matches(|c: char| c == '?' || c == '&');
        self.query_string = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Append a structured query parameter, placed after the opaque query string.
    pub fn add_query_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Enable or disable the trailing access token.
    pub fn set_access_token(&mut self, enabled: bool) -> &mut Self {
        self.access_token = enabled;
        self
    }

    fn assemble_query(
        &self,
        transformations: &[String],
        encode: bool,
        with_public_key: bool,
    ) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(ref query_string) = self.query_string {
            let trimmed = query_string.trim_start_matches(|c: char| c == '?' || c == '&');
            if !trimmed.is_empty() && encode {
                parts.push(encode_query_string(trimmed));
            } else if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }

        for (key, value) in &self.query_params {
            parts.push(query_pair(key, value, encode));
        }

        for transformation in transformations {
            parts.push(query_pair("t[]", transformation, encode));
        }

        if with_public_key && self.credentials.is_delegated() {
            parts.push(query_pair("publicKey", self.credentials.public_key(), encode));
        }

        parts.join("&")
    }

    /// Query string without the access token.
    pub fn query_string(&self, encode: bool) -> String {
        self.assemble_query(&[], encode, true)
    }

    /// Human-readable URL without the access token
    pub fn raw_url(&self) -> String {
        self.render_raw(&self.path, &[])
    }

    /// Final URL, including the access token unless disabled
    pub fn url(&self) -> String {
        self.render(&self.path, &[])
    }

    pub(crate) fn render_raw(&self, path: &str, transformations: &[String]) -> String {
        compose(
            &self.base_url,
            path,
            &self.assemble_query(transformations, false, true),
        )
    }

    /// The token is computed over the human-readable URL while the emitted
    /// query string is encoded; the service decodes before verifying.
    pub(crate) fn render(&self, path: &str, transformations: &[String]) -> String {
        let encoded = compose(
            &self.base_url,
            path,
            &self.assemble_query(transformations, true, true),
        );
        if !self.access_token {
            return encoded;
        }

        let raw = self.render_raw(path, transformations);
        let token = signer::access_token(self.credentials.private_key(), &raw);
        tracing::debug!(url = %raw, "Generated access token");
        append_param(&encoded, "accessToken", &token)
    }

    /// Signed URL for a mutating request against this resource.
    pub fn signed_url(&self, method: &str, timestamp: &DateTime<Utc>) -> String {
        self.signed_url_at(&self.path, method, timestamp)
    }

    pub(crate) fn signed_url_at(
        &self,
        path: &str,
        method: &str,
        timestamp: &DateTime<Utc>,
    ) -> String {
        let unsigned = compose(
            &self.base_url,
            path,
            &self.assemble_query(&[], false, false),
        );
        signed_resource_url(&self.credentials, method, &unsigned, timestamp)
    }
}

impl fmt::Display for ImboUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Sign `url` for a mutating request.
///
/// Appends `publicKey=` (when the key acts for another user) before signing,
/// then `signature=` and the encoded `timestamp=`.
pub fn signed_resource_url(
    credentials: &Credentials,
    method: &str,
    url: &str,
    timestamp: &DateTime<Utc>,
) -> String {
    let url = if credentials.is_delegated() {
        append_param(url, "publicKey", credentials.public_key())
    } else {
        url.to_string()
    };

    let method = method.to_ascii_uppercase();
    let timestamp = signer::format_timestamp(timestamp);
    let signature = signer::request_signature(
        credentials.private_key(),
        &method,
        &url,
        credentials.public_key(),
        &timestamp,
    );
    tracing::debug!(method = %method, url = %url, timestamp = %timestamp, "Signed request");

    let signed = append_param(&url, "signature", &signature);
    format!("{}&timestamp={}", signed, encode_component(&timestamp))
}
