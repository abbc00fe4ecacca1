//! Imbo Core Library
//!
//! This crate builds and signs URLs for the Imbo image server: the
//! transformation pipeline, canonical query strings, access tokens and
//! request signatures. Output is byte-for-byte deterministic because the
//! server recomputes every token and signature.

pub mod config;
pub mod error;
pub mod signer;
pub mod transformation;
pub mod url;

// Re-export commonly used types
pub use config::{ClientConfig, Credentials};
pub use error::{ErrorMetadata, ImboError, ImboResult, LogLevel};
pub use transformation::{ImageFormat, Transformation};
pub use url::{signed_resource_url, ImageUrl, ImagesQuery, ImboUrl, UrlOptions};
