//! Photo pipeline: raw file bytes to data URLs, and non-destructive
//! rotate/crop edits re-encoded as JPEG.
//!
//! Nothing here returns an error to the caller. A failed decode or encode is
//! logged and the input is handed back unchanged (or `""` for empty input).

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use tracing::warn;

use crate::error::{Error, Result};

pub const JPEG_MIME: &str = "image/jpeg";
pub const DEFAULT_JPEG_QUALITY: u8 = 82;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Clockwise degrees, rounded to the nearest quarter turn.
    pub fn from_degrees(degrees: i32) -> Self {
        let quarters = ((degrees as f32) / 90.0).round() as i32;
        match quarters.rem_euclid(4) {
            1 => Rotation::Quarter,
            2 => Rotation::Half,
            3 => Rotation::ThreeQuarter,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }

    pub fn rotate_right(self) -> Self {
        Self::from_degrees(self.degrees() + 90)
    }

    pub fn rotate_left(self) -> Self {
        Self::from_degrees(self.degrees() - 90)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub rotation: Rotation,
    pub crop: bool,
    /// Longest side after the transform; `None` keeps the source size.
    pub max_dimension: Option<u32>,
    pub quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            rotation: Rotation::None,
            crop: false,
            max_dimension: None,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its mime type and payload bytes.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url.strip_prefix("data:").ok_or(Error::DataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(Error::DataUrl)?;
    let mime = meta.strip_suffix(";base64").ok_or(Error::DataUrl)?;
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime.to_string(), bytes))
}

pub fn image_dimensions(data_url: &str) -> Option<(u32, u32)> {
    let (_, bytes) = decode_data_url(data_url).ok()?;
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Turn a picked file into a data URL for storage.
///
/// Images larger than `options.max_dimension` are downscaled and re-encoded as
/// JPEG; anything that does not decode is embedded as-is.
pub fn file_to_data_url(bytes: &[u8], mime: &str, options: &ImageOptions) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    let mime = if mime.trim().is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    let Some(max) = options.max_dimension else {
        return encode_data_url(mime, bytes);
    };

    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!("Picked file is not a decodable image ({}): {}", mime, e);
            return encode_data_url(mime, bytes);
        }
    };
    if img.width().max(img.height()) <= max {
        return encode_data_url(mime, bytes);
    }
    match encode_jpeg(&bound(img, max), options.quality) {
        Ok(jpeg) => encode_data_url(JPEG_MIME, &jpeg),
        Err(e) => {
            warn!("Re-encoding picked image failed: {}", e);
            encode_data_url(mime, bytes)
        }
    }
}

/// Apply rotation, optional center-square crop and size bound, then re-encode
/// as JPEG. Returns `data_url` unchanged when anything fails.
pub fn transform_image(data_url: &str, options: &ImageOptions) -> String {
    match try_transform(data_url, options) {
        Ok(out) => out,
        Err(e) => {
            warn!("Image transform failed, keeping original: {}", e);
            data_url.to_string()
        }
    }
}

fn try_transform(data_url: &str, options: &ImageOptions) -> Result<String> {
    let (_, bytes) = decode_data_url(data_url)?;
    let mut img = image::load_from_memory(&bytes)?;

    img = match options.rotation {
        Rotation::None => img,
        Rotation::Quarter => img.rotate90(),
        Rotation::Half => img.rotate180(),
        Rotation::ThreeQuarter => img.rotate270(),
    };

    if options.crop {
        img = center_square(img);
    }

    if let Some(max) = options.max_dimension {
        img = bound(img, max);
    }

    let jpeg = encode_jpeg(&img, options.quality)?;
    Ok(encode_data_url(JPEG_MIME, &jpeg))
}

fn center_square(img: DynamicImage) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let size = w.min(h);
    img.crop_imm((w - size) / 2, (h - size) / 2, size, size)
}

fn bound(img: DynamicImage, max: u32) -> DynamicImage {
    if max == 0 || img.width().max(img.height()) <= max {
        return img;
    }
    img.resize(max, max, FilterType::Triangle)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder.encode_image(&rgb)?;
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAction {
    RotateLeft,
    RotateRight,
    ToggleCrop,
    Reset,
}

impl ImageAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageAction::RotateLeft => "rotate-left",
            ImageAction::RotateRight => "rotate-right",
            ImageAction::ToggleCrop => "crop",
            ImageAction::Reset => "reset",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rotate-left" => Some(ImageAction::RotateLeft),
            "rotate-right" => Some(ImageAction::RotateRight),
            "crop" => Some(ImageAction::ToggleCrop),
            "reset" => Some(ImageAction::Reset),
            _ => None,
        }
    }

    pub fn all() -> &'static [ImageAction] {
        &[
            ImageAction::RotateLeft,
            ImageAction::RotateRight,
            ImageAction::ToggleCrop,
            ImageAction::Reset,
        ]
    }
}

/// Pending edits on a photo. Edits are parameters, not pixels: every render
/// starts again from `base`, so repeated edits never compound JPEG loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEditState {
    pub base: String,
    pub rotation: Rotation,
    pub crop: bool,
}

impl ImageEditState {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            rotation: Rotation::None,
            crop: false,
        }
    }

    pub fn apply(&mut self, action: ImageAction) {
        match action {
            ImageAction::RotateLeft => self.rotation = self.rotation.rotate_left(),
            ImageAction::RotateRight => self.rotation = self.rotation.rotate_right(),
            ImageAction::ToggleCrop => self.crop = !self.crop,
            ImageAction::Reset => {
                self.rotation = Rotation::None;
                self.crop = false;
            }
        }
    }

    pub fn render(&self, defaults: &ImageOptions) -> String {
        transform_image(
            &self.base,
            &ImageOptions {
                rotation: self.rotation,
                crop: self.crop,
                ..*defaults
            },
        )
    }
}
