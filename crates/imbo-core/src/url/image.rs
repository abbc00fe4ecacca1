//! Image URL builder
//!
//! Accumulates an ordered transformation pipeline for one image and renders
//! it as `t[]=` query entries.
//!
//! # Example
//!
//! ```rust
//! use imbo_core::url::{ImageUrl, UrlOptions};
//!
//! let mut url = ImageUrl::new(UrlOptions {
//!     base_url: "http://imbo".to_string(),
//!     public_key: "pub".to_string(),
//!     private_key: "priv".to_string(),
//!     image_identifier: Some("61da9892205a0d5077a353eb3487e8c8".to_string()),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! url.flip_horizontally().desaturate().png();
//! assert_eq!(
//!     url.query_string(false),
//!     "t[]=flipHorizontally&t[]=desaturate"
//! );
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

use super::{ImboUrl, UrlOptions};
use crate::config::Credentials;
use crate::error::{ImboError, ImboResult};
use crate::transformation::{
    AngleArg, Border, Canvas, Compress, Crop, ImageFormat, Modulate, Sepia, Size, Thumbnail,
    Transformation, Watermark,
};

fn image_path(user: &str, image_identifier: &str) -> String {
    format!("/users/{}/images/{}", user, image_identifier)
}

/// URL of a single image plus its transformation pipeline.
///
/// Transformation methods append exactly one [`Transformation`] and return
/// `&mut Self` so calls can be chained. Fallible ones leave the URL untouched
/// when they return an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUrl {
    base: ImboUrl,
    image_identifier: String,
    extension: Option<ImageFormat>,
    transformations: Vec<Transformation>,
}

impl ImageUrl {
    /// Create an image URL from construction options.
    pub fn new(options: UrlOptions) -> ImboResult<Self> {
        let credentials = Credentials::new(options.public_key, options.private_key, options.user)?;
        let image_identifier = options.image_identifier.unwrap_or_default();
        let mut url = Self::with_credentials(&options.base_url, credentials, &image_identifier)?;
        if let Some(ref query_string) = options.query_string {
            url.base.set_query_string(query_string);
        }
        Ok(url)
    }

    /// Create an image URL for already validated credentials.
    pub fn with_credentials(
        base_url: &str,
        credentials: Credentials,
        image_identifier: &str,
    ) -> ImboResult<Self> {
        if image_identifier.is_empty() {
            return Err(ImboError::invalid_configuration(
                "image identifier must be set",
            ));
        }
        if image_identifier.contains(['/', '?', '#']) {
            return Err(ImboError::invalid_configuration(format!(
                "image identifier contains reserved characters: {:?}",
                image_identifier
            )));
        }

        let path = image_path(credentials.user(), image_identifier);
        Ok(Self {
            base: ImboUrl::new(base_url, path, credentials)?,
            image_identifier: image_identifier.to_string(),
            extension: None,
            transformations: Vec::new(),
        })
    }

    pub fn image_identifier(&self) -> &str {
        &self.image_identifier
    }

    pub fn extension(&self) -> Option<ImageFormat> {
        self.extension
    }

    /// Underlying resource URL (base, path, credentials, passthrough query)
    pub fn base(&self) -> &ImboUrl {
        &self.base
    }

    pub fn set_query_string(&mut self, query_string: &str) -> &mut Self {
        self.base.set_query_string(query_string);
        self
    }

    pub fn set_access_token(&mut self, enabled: bool) -> &mut Self {
        self.base.set_access_token(enabled);
        self
    }

    /// Append a transformation value.
    pub fn add_transformation(&mut self, transformation: Transformation) -> &mut Self {
        self.transformations.push(transformation);
        self
    }

    /// Append a pre-formatted `name:k=v,...` transformation verbatim.
    pub fn append(&mut self, transformation: &str) -> &mut Self {
        self.add_transformation(Transformation::Raw(transformation.to_string()))
    }

    pub fn auto_rotate(&mut self) -> &mut Self {
        self.add_transformation(Transformation::AutoRotate)
    }

    pub fn border(&mut self, border: Border) -> &mut Self {
        self.add_transformation(Transformation::Border(border))
    }

    pub fn canvas(&mut self, canvas: Canvas) -> &mut Self {
        self.add_transformation(Transformation::Canvas(canvas))
    }

    pub fn compress(&mut self, compress: Compress) -> &mut Self {
        self.add_transformation(Transformation::Compress(compress))
    }

    pub fn crop(&mut self, crop: Crop) -> &mut Self {
        self.add_transformation(Transformation::Crop(crop))
    }

    pub fn desaturate(&mut self) -> &mut Self {
        self.add_transformation(Transformation::Desaturate)
    }

    pub fn flip_horizontally(&mut self) -> &mut Self {
        self.add_transformation(Transformation::FlipHorizontally)
    }

    pub fn flip_vertically(&mut self) -> &mut Self {
        self.add_transformation(Transformation::FlipVertically)
    }

    /// Scale down to fit within the given box. At least one side is required.
    pub fn max_size(&mut self, width: Option<u32>, height: Option<u32>) -> ImboResult<&mut Self> {
        let size = Size::new(width, height)?;
        Ok(self.add_transformation(Transformation::MaxSize(size)))
    }

    pub fn modulate(&mut self, modulate: Modulate) -> &mut Self {
        self.add_transformation(Transformation::Modulate(modulate))
    }

    pub fn progressive(&mut self) -> &mut Self {
        self.add_transformation(Transformation::Progressive)
    }

    /// Resize to the given dimensions. At least one side is required.
    pub fn resize(&mut self, width: Option<u32>, height: Option<u32>) -> ImboResult<&mut Self> {
        let size = Size::new(width, height)?;
        Ok(self.add_transformation(Transformation::Resize(size)))
    }

    /// Rotate by `angle` degrees. Non-numeric angles are rejected.
    pub fn rotate(&mut self, angle: impl AngleArg, bg: Option<&str>) -> ImboResult<&mut Self> {
        let rotate = Transformation::rotate(angle, bg)?;
        Ok(self.add_transformation(rotate))
    }

    pub fn sepia(&mut self, sepia: Sepia) -> &mut Self {
        self.add_transformation(Transformation::Sepia(sepia))
    }

    pub fn strip(&mut self) -> &mut Self {
        self.add_transformation(Transformation::Strip)
    }

    pub fn thumbnail(&mut self, thumbnail: Thumbnail) -> &mut Self {
        self.add_transformation(Transformation::Thumbnail(thumbnail))
    }

    pub fn transpose(&mut self) -> &mut Self {
        self.add_transformation(Transformation::Transpose)
    }

    pub fn transverse(&mut self) -> &mut Self {
        self.add_transformation(Transformation::Transverse)
    }

    pub fn watermark(&mut self, watermark: Watermark) -> &mut Self {
        self.add_transformation(Transformation::Watermark(watermark))
    }

    /// Set the output format. The last call wins.
    pub fn format(&mut self, format: ImageFormat) -> &mut Self {
        self.extension = Some(format);
        self
    }

    /// Set the output format from its name ("png", "jpg"/"jpeg" or "gif").
    pub fn convert(&mut self, format: &str) -> ImboResult<&mut Self> {
        let format = format.parse::<ImageFormat>()?;
        Ok(self.format(format))
    }

    pub fn png(&mut self) -> &mut Self {
        self.format(ImageFormat::Png)
    }

    pub fn jpg(&mut self) -> &mut Self {
        self.format(ImageFormat::Jpg)
    }

    pub fn gif(&mut self) -> &mut Self {
        self.format(ImageFormat::Gif)
    }

    /// Clear transformations and output format. Identity fields are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.transformations.clear();
        self.extension = None;
        self
    }

    /// Transformation values in application order.
    pub fn pipeline(&self) -> &[Transformation] {
        &self.transformations
    }

    /// Canonical (unencoded) transformations in application order.
    /// Format conversions are not included.
    pub fn transformations(&self) -> Vec<String> {
        self.transformations.iter().map(|t| t.to_string()).collect()
    }

    /// Path including the `.<ext>` suffix when an output format is set
    pub fn path(&self) -> String {
        match self.extension {
            Some(format) => format!("{}.{}", self.base.path(), format.extension()),
            None => self.base.path().to_string(),
        }
    }

    /// Query string without the access token.
    pub fn query_string(&self, encode: bool) -> String {
        self.base
            .assemble_query(&self.transformations(), encode, true)
    }

    /// Human-readable URL without the access token
    pub fn raw_url(&self) -> String {
        self.base.render_raw(&self.path(), &self.transformations())
    }

    /// Final URL with encoded query string and access token
    pub fn url(&self) -> String {
        self.base.render(&self.path(), &self.transformations())
    }

    /// Signed URL for a mutating request against the image, including the
    /// `.<ext>` suffix when an output format is set.
    pub fn signed_url(&self, method: &str, timestamp: &DateTime<Utc>) -> String {
        self.base.signed_url_at(&self.path(), method, timestamp)
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_ID: &str = "61da9892205a0d5077a353eb3487e8c8";

    fn options() -> UrlOptions {
        UrlOptions {
            base_url: "http://imbo".to_string(),
            public_key: "pub".to_string(),
            private_key: "priv".to_string(),
            image_identifier: Some(IMAGE_ID.to_string()),
            ..Default::default()
        }
    }

    fn image_url() -> ImageUrl {
        ImageUrl::new(options()).unwrap()
    }

    #[test]
    fn test_missing_identifier_rejected() {
        let options = UrlOptions {
            image_identifier: None,
            ..options()
        };
        assert!(matches!(
            ImageUrl::new(options),
            Err(ImboError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_user_defaults_to_public_key_in_path() {
        assert_eq!(image_url().path(), format!("/users/pub/images/{}", IMAGE_ID));
    }

    #[test]
    fn test_explicit_user_in_path() {
        let url = ImageUrl::new(UrlOptions {
            user: Some("espen".to_string()),
            ..options()
        })
        .unwrap();
        assert_eq!(url.path(), format!("/users/espen/images/{}", IMAGE_ID));
        assert_eq!(url.query_string(false), "publicKey=pub");
    }

    #[test]
    fn test_unencoded_query_string() {
        let mut url = image_url();
        url.flip_horizontally().border(Border {
            color: "c00c00".to_string(),
            width: 13,
            height: 37,
        });
        assert_eq!(
            url.query_string(false),
            "t[]=flipHorizontally&t[]=border:color=c00c00,width=13,height=37"
        );
    }

    #[test]
    fn test_encoded_query_string() {
        let mut url = image_url();
        url.flip_horizontally().border(Border {
            color: "c00c00".to_string(),
            width: 13,
            height: 37,
        });
        assert_eq!(
            url.query_string(true),
            "t%5B%5D=flipHorizontally&t%5B%5D=border%3Acolor%3Dc00c00%2Cwidth%3D13%2Cheight%3D37"
        );
    }

    #[test]
    fn test_existing_query_string_comes_first() {
        let url_options = UrlOptions {
            query_string: Some("foo=bar".to_string()),
            ..options()
        };
        let mut url = ImageUrl::new(url_options).unwrap();
        url.strip();
        assert_eq!(url.query_string(false), "foo=bar&t[]=strip");
    }

    #[test]
    fn test_format_conversion_sets_extension() {
        let mut url = image_url();
        url.png().gif();
        assert_eq!(url.extension(), Some(ImageFormat::Gif));
        assert!(url.path().ends_with(".gif"));
        assert!(url.transformations().is_empty());

        url.convert("jpeg").unwrap();
        assert!(url.path().ends_with(".jpg"));
        assert!(url.convert("tiff").is_err());
        assert_eq!(url.extension(), Some(ImageFormat::Jpg));
    }

    #[test]
    fn test_failed_rotate_does_not_mutate() {
        let mut url = image_url();
        url.desaturate();
        let before = url.clone();
        assert!(matches!(
            url.rotate("sideways", None),
            Err(ImboError::InvalidArgument(_))
        ));
        assert_eq!(url, before);
    }

    #[test]
    fn test_max_size_requires_a_dimension() {
        let mut url = image_url();
        assert!(url.max_size(None, None).is_err());
        assert!(url.resize(None, None).is_err());
        assert!(url.transformations().is_empty());

        url.resize(Some(100), None).unwrap().max_size(None, Some(50)).unwrap();
        assert_eq!(
            url.transformations(),
            vec!["resize:width=100", "maxSize:height=50"]
        );
    }

    #[test]
    fn test_append_raw() {
        let mut url = image_url();
        url.append("foo:bar=baz").flip_vertically();
        assert_eq!(url.transformations(), vec!["foo:bar=baz", "flipVertically"]);
    }

    #[test]
    fn test_reset_clears_transformations_and_extension() {
        let mut url = image_url();
        url.thumbnail(Thumbnail::default()).jpg();
        url.reset();
        assert!(url.transformations().is_empty());
        assert_eq!(url.extension(), None);
        assert_eq!(url.image_identifier(), IMAGE_ID);
    }

    #[test]
    fn test_signed_url_keeps_extension() {
        use chrono::TimeZone;

        let mut url = image_url();
        url.png();
        let timestamp = Utc.timestamp_millis_opt(1349268217000).unwrap();
        let target = format!("http://imbo/users/pub/images/{}.png", IMAGE_ID);
        let signature = crate::signer::request_signature(
            "priv",
            "DELETE",
            &target,
            "pub",
            "2012-10-03T12:43:37Z",
        );
        assert_eq!(
            url.signed_url("delete", &timestamp),
            format!(
                "{}?signature={}&timestamp=2012-10-03T12%3A43%3A37Z",
                target, signature
            )
        );
    }

    #[test]
    fn test_opaque_query_encoded_alongside_transformations() {
        let mut url = ImageUrl::new(UrlOptions {
            query_string: Some("q=a b&t[]=strip".to_string()),
            ..options()
        })
        .unwrap();
        url.desaturate();
        assert_eq!(
            url.query_string(true),
            "q=a%20b&t%5B%5D=strip&t%5B%5D=desaturate"
        );
        assert!(url
            .raw_url()
            .ends_with("?q=a b&t[]=strip&t[]=desaturate"));
    }

    #[test]
    fn test_display_matches_url() {
        let mut url = image_url();
        url.sepia(Sepia::default());
        assert_eq!(url.to_string(), url.url());
    }
}
