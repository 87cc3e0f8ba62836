use std::path::Path;

use image::RgbaImage;
use log::{debug, info};

use crate::error::{ComparisonError, Result};
use crate::geometry::Size;

/// A decoded image and its optional label. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub source: String,
    pub label: Option<String>,
    pixels: RgbaImage,
}

impl ImageAsset {
    pub fn new(source: impl Into<String>, pixels: RgbaImage, label: Option<String>) -> Self {
        Self {
            source: source.into(),
            label: label.filter(|l| !l.trim().is_empty()),
            pixels,
        }
    }

    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.natural_width() as f64, self.natural_height() as f64)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Both images of a comparison. Only exists once both have decoded.
#[derive(Debug, Clone)]
pub struct ImagePair {
    pub before: ImageAsset,
    pub after: ImageAsset,
}

/// Encoded bytes of one side plus where they came from.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub source: String,
    pub bytes: Vec<u8>,
    pub label: Option<String>,
}

impl EncodedImage {
    pub fn from_path(path: &Path, label: Option<String>) -> Result<Self> {
        debug!("Reading image file {}", path.display());
        let bytes = std::fs::read(path).map_err(|e| {
            ComparisonError::missing(format!("cannot read '{}': {e}", path.display()))
        })?;
        Ok(Self {
            source: path.display().to_string(),
            bytes,
            label,
        })
    }
}

pub fn decode_image(side: &'static str, encoded: EncodedImage) -> Result<ImageAsset> {
    let decoded = image::load_from_memory(&encoded.bytes).map_err(|source| {
        ComparisonError::Decode {
            side,
            source_name: encoded.source.clone(),
            source,
        }
    })?;
    let asset = ImageAsset::new(encoded.source, decoded.to_rgba8(), encoded.label);
    if asset.natural_width() == 0 || asset.natural_height() == 0 {
        return Err(ComparisonError::missing(format!("{side} image is empty")));
    }
    debug!(
        "Decoded {} image {} ({}x{})",
        side,
        asset.source,
        asset.natural_width(),
        asset.natural_height()
    );
    Ok(asset)
}

/// Decodes both images in parallel and joins on the pair.
///
/// Either failure is fatal; the before-image error wins when both fail.
pub fn decode_pair(before: EncodedImage, after: EncodedImage) -> Result<ImagePair> {
    let (before, after) = rayon::join(
        || decode_image("before", before),
        || decode_image("after", after),
    );
    let pair = ImagePair {
        before: before?,
        after: after?,
    };
    info!(
        "Decoded image pair: {}x{} and {}x{}",
        pair.before.natural_width(),
        pair.before.natural_height(),
        pair.after.natural_width(),
        pair.after.natural_height()
    );
    Ok(pair)
}

pub fn load_pair_from_paths(
    before: &Path,
    after: &Path,
    before_label: Option<String>,
    after_label: Option<String>,
) -> Result<ImagePair> {
    info!(
        "Loading images from {} and {}",
        before.display(),
        after.display()
    );
    decode_pair(
        EncodedImage::from_path(before, before_label)?,
        EncodedImage::from_path(after, after_label)?,
    )
}
