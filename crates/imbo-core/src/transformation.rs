//! Image transformations
//!
//! Every transformation the Imbo service understands is a variant of
//! [`Transformation`]. Each variant renders to a canonical
//! `name:key=value,key=value` string whose key order and defaults are part of
//! the wire contract: the service recomputes access tokens over that exact
//! text.
//!
//! # Example
//!
//! ```rust
//! use imbo_core::transformation::{Border, Transformation};
//!
//! let border = Transformation::Border(Border::with_color("#bf1942"));
//! assert_eq!(border.to_string(), "border:color=bf1942,width=1,height=1");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ImboError, ImboResult};

const DEFAULT_COLOR: &str = "000000";
const DEFAULT_COMPRESS_LEVEL: u32 = 75;
const DEFAULT_SEPIA_THRESHOLD: u32 = 80;
const DEFAULT_THUMBNAIL_SIZE: u32 = 50;
const DEFAULT_THUMBNAIL_FIT: &str = "outbound";
const DEFAULT_WATERMARK_POSITION: &str = "top-left";

/// Strip a single leading `#` from a color value.
fn strip_hash(color: &str) -> String {
    color.strip_prefix('#').unwrap_or(color).to_string()
}

/// Border around the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Border {
    pub color: String,
    pub width: u32,
    pub height: u32,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            width: 1,
            height: 1,
        }
    }
}

impl Border {
    /// Border of the given color with the default 1x1 size
    pub fn with_color(color: &str) -> Self {
        Self {
            color: color.to_string(),
            ..Self::default()
        }
    }
}

/// Canvas the image is placed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Placement mode: "free", "center", "center-x" or "center-y"
    pub mode: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    /// Background color
    pub bg: Option<String>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// Crop region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Crop {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    /// Crop mode: "center", "center-x" or "center-y"
    pub mode: Option<String>,
}

impl Crop {
    pub fn new(width: u32, height: u32, x: u32, y: u32) -> Self {
        Self {
            width,
            height,
            x,
            y,
            mode: None,
        }
    }
}

/// Compression level, 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compress {
    pub level: u32,
}

impl Default for Compress {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESS_LEVEL,
        }
    }
}

impl Compress {
    /// Accepts a number or a string of digits
    pub fn level(level: impl IntegerArg) -> ImboResult<Self> {
        Ok(Self {
            level: level.into_integer("level")?,
        })
    }
}

/// Target dimensions for `maxSize` and `resize`. At least one side is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    width: Option<u32>,
    height: Option<u32>,
}

impl Size {
    pub fn new(width: Option<u32>, height: Option<u32>) -> ImboResult<Self> {
        if width.is_none() && height.is_none() {
            return Err(ImboError::invalid_argument(
                "width and/or height must be specified",
            ));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }
}

/// Brightness, saturation and hue adjustment, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modulate {
    pub brightness: Option<u32>,
    pub saturation: Option<u32>,
    pub hue: Option<u32>,
}

/// Sepia tone with the given threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sepia {
    pub threshold: u32,
}

impl Default for Sepia {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SEPIA_THRESHOLD,
        }
    }
}

impl Sepia {
    /// Accepts a number or a string of digits
    pub fn threshold(threshold: impl IntegerArg) -> ImboResult<Self> {
        Ok(Self {
            threshold: threshold.into_integer("threshold")?,
        })
    }
}

/// Thumbnail with fit mode ("outbound" or "inset").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub fit: String,
}

impl Default for Thumbnail {
    fn default() -> Self {
        Self {
            width: DEFAULT_THUMBNAIL_SIZE,
            height: DEFAULT_THUMBNAIL_SIZE,
            fit: DEFAULT_THUMBNAIL_FIT.to_string(),
        }
    }
}

/// Watermark overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    /// Position: "top-left", "top-right", "bottom-left", "bottom-right" or "center"
    pub position: String,
    pub x: i32,
    pub y: i32,
    /// Image identifier of the watermark (server default when absent)
    pub img: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            position: DEFAULT_WATERMARK_POSITION.to_string(),
            x: 0,
            y: 0,
            img: None,
            width: None,
            height: None,
        }
    }
}

/// One applied image transformation.
///
/// Values are immutable once constructed; the builder in
/// [`crate::url::ImageUrl`] only ever appends new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformation {
    AutoRotate,
    Border(Border),
    Canvas(Canvas),
    Compress(Compress),
    Crop(Crop),
    Desaturate,
    FlipHorizontally,
    FlipVertically,
    MaxSize(Size),
    Modulate(Modulate),
    Progressive,
    Resize(Size),
    /// `angle` holds the canonical numeric text, validated at construction
    Rotate { angle: String, bg: String },
    Sepia(Sepia),
    Strip,
    Thumbnail(Thumbnail),
    Transpose,
    Transverse,
    Watermark(Watermark),
    /// Pre-formatted `name:k=v,...` string, emitted verbatim
    Raw(String),
}

impl Transformation {
    /// Build a rotate transformation, rejecting non-numeric angles.
    pub fn rotate(angle: impl AngleArg, bg: Option<&str>) -> ImboResult<Self> {
        Ok(Transformation::Rotate {
            angle: angle.into_angle()?,
            bg: bg.unwrap_or(DEFAULT_COLOR).to_string(),
        })
    }

    /// Transformation name as understood by the service
    pub fn name(&self) -> &str {
        match self {
            Transformation::AutoRotate => "autoRotate",
            Transformation::Border(_) => "border",
            Transformation::Canvas(_) => "canvas",
            Transformation::Compress(_) => "compress",
            Transformation::Crop(_) => "crop",
            Transformation::Desaturate => "desaturate",
            Transformation::FlipHorizontally => "flipHorizontally",
            Transformation::FlipVertically => "flipVertically",
            Transformation::MaxSize(_) => "maxSize",
            Transformation::Modulate(_) => "modulate",
            Transformation::Progressive => "progressive",
            Transformation::Resize(_) => "resize",
            Transformation::Rotate { .. } => "rotate",
            Transformation::Sepia(_) => "sepia",
            Transformation::Strip => "strip",
            Transformation::Thumbnail(_) => "thumbnail",
            Transformation::Transpose => "transpose",
            Transformation::Transverse => "transverse",
            Transformation::Watermark(_) => "watermark",
            Transformation::Raw(raw) => raw.split(':').next().unwrap_or(raw),
        }
    }

    /// Parameters in wire order, with defaults applied and optional
    /// parameters omitted when unset.
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        match self {
            Transformation::Border(border) => {
                params.push(("color", strip_hash(&border.color)));
                params.push(("width", border.width.to_string()));
                params.push(("height", border.height.to_string()));
            }
            Transformation::Canvas(canvas) => {
                params.push(("width", canvas.width.to_string()));
                params.push(("height", canvas.height.to_string()));
                if let Some(ref mode) = canvas.mode {
                    params.push(("mode", mode.clone()));
                }
                if let Some(x) = canvas.x {
                    params.push(("x", x.to_string()));
                }
                if let Some(y) = canvas.y {
                    params.push(("y", y.to_string()));
                }
                if let Some(ref bg) = canvas.bg {
                    params.push(("bg", strip_hash(bg)));
                }
            }
            Transformation::Compress(compress) => {
                params.push(("level", compress.level.to_string()));
            }
            Transformation::Crop(crop) => {
                params.push(("width", crop.width.to_string()));
                params.push(("height", crop.height.to_string()));
                params.push(("x", crop.x.to_string()));
                params.push(("y", crop.y.to_string()));
                if let Some(ref mode) = crop.mode {
                    params.push(("mode", mode.clone()));
                }
            }
            Transformation::MaxSize(size) | Transformation::Resize(size) => {
                if let Some(width) = size.width {
                    params.push(("width", width.to_string()));
                }
                if let Some(height) = size.height {
                    params.push(("height", height.to_string()));
                }
            }
            Transformation::Modulate(modulate) => {
                if let Some(b) = modulate.brightness {
                    params.push(("b", b.to_string()));
                }
                if let Some(s) = modulate.saturation {
                    params.push(("s", s.to_string()));
                }
                if let Some(h) = modulate.hue {
                    params.push(("h", h.to_string()));
                }
            }
            Transformation::Rotate { angle, bg } => {
                params.push(("angle", angle.clone()));
                params.push(("bg", strip_hash(bg)));
            }
            Transformation::Sepia(sepia) => {
                params.push(("threshold", sepia.threshold.to_string()));
            }
            Transformation::Thumbnail(thumbnail) => {
                params.push(("width", thumbnail.width.to_string()));
                params.push(("height", thumbnail.height.to_string()));
                params.push(("fit", thumbnail.fit.clone()));
            }
            Transformation::Watermark(watermark) => {
                params.push(("position", watermark.position.clone()));
                params.push(("x", watermark.x.to_string()));
                params.push(("y", watermark.y.to_string()));
                if let Some(ref img) = watermark.img {
                    params.push(("img", img.clone()));
                }
                if let Some(width) = watermark.width {
                    params.push(("width", width.to_string()));
                }
                if let Some(height) = watermark.height {
                    params.push(("height", height.to_string()));
                }
            }
            Transformation::AutoRotate
            | Transformation::Desaturate
            | Transformation::FlipHorizontally
            | Transformation::FlipVertically
            | Transformation::Progressive
            | Transformation::Strip
            | Transformation::Transpose
            | Transformation::Transverse
            | Transformation::Raw(_) => {}
        }
        params
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Transformation::Raw(raw) = self {
            return f.write_str(raw);
        }

        f.write_str(self.name())?;
        for (i, (key, value)) in self.params().iter().enumerate() {
            let sep = if i == 0 { ':' } else { ',' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

impl Serialize for Transformation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Output format set by the format conversion calls. Not a transformation:
/// it becomes the `.<ext>` suffix of the image identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpg,
    Gif,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Gif => "gif",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = ImboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            "gif" => Ok(ImageFormat::Gif),
            other => Err(ImboError::invalid_argument(format!(
                "unsupported image format: {:?}",
                other
            ))),
        }
    }
}

/// Narrow integer coercion for parameters that accept either a number or a
/// string of digits (`compress("40")` is the same as `compress(40)`).
pub trait IntegerArg {
    fn into_integer(self, name: &str) -> ImboResult<u32>;
}

impl IntegerArg for u32 {
    fn into_integer(self, _name: &str) -> ImboResult<u32> {
        Ok(self)
    }
}

impl IntegerArg for u8 {
    fn into_integer(self, _name: &str) -> ImboResult<u32> {
        Ok(u32::from(self))
    }
}

impl IntegerArg for u16 {
    fn into_integer(self, _name: &str) -> ImboResult<u32> {
        Ok(u32::from(self))
    }
}

impl IntegerArg for &str {
    fn into_integer(self, name: &str) -> ImboResult<u32> {
        let trimmed = self.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ImboError::invalid_argument(format!(
                "{} must be a non-negative integer, got {:?}",
                name, self
            )));
        }
        trimmed.parse::<u32>().map_err(|_| {
            ImboError::invalid_argument(format!("{} is out of range: {:?}", name, self))
        })
    }
}

impl IntegerArg for String {
    fn into_integer(self, name: &str) -> ImboResult<u32> {
        self.as_str().into_integer(name)
    }
}

/// Rotation angle coercion. Accepts integers, finite floats and strings that
/// parse as a finite number (sign, decimals and exponent allowed). String
/// angles keep the caller's text.
pub trait AngleArg {
    fn into_angle(self) -> ImboResult<String>;
}

impl AngleArg for i32 {
    fn into_angle(self) -> ImboResult<String> {
        Ok(self.to_string())
    }
}

impl AngleArg for u32 {
    fn into_angle(self) -> ImboResult<String> {
        Ok(self.to_string())
    }
}

impl AngleArg for f64 {
    fn into_angle(self) -> ImboResult<String> {
        if !self.is_finite() {
            return Err(ImboError::invalid_argument(format!(
                "angle must be a finite number, got {}",
                self
            )));
        }
        // f64's Display renders 90.0 as "90" and 45.5 as "45.5"
        Ok(self.to_string())
    }
}

impl AngleArg for f32 {
    fn into_angle(self) -> ImboResult<String> {
        if !self.is_finite() {
            return Err(ImboError::invalid_argument(format!(
                "angle must be a finite number, got {}",
                self
            )));
        }
        Ok(self.to_string())
    }
}

impl AngleArg for &str {
    fn into_angle(self) -> ImboResult<String> {
        let trimmed = self.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(trimmed.to_string()),
            _ => Err(ImboError::invalid_argument(format!(
                "angle must be numeric, got {:?}",
                self
            ))),
        }
    }
}

impl AngleArg for String {
    fn into_angle(self) -> ImboResult<String> {
        self.as_str().into_angle()
    }
}
