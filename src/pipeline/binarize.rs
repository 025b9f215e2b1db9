//! Binarization: decode, grayscale, and Otsu-threshold the receipt image.
//!
//! ## Why spawn_blocking?
//!
//! Decoding a multi-megapixel JPEG and walking every pixel twice is
//! CPU-bound work. `tokio::task::spawn_blocking` moves it onto the blocking
//! thread pool so the async executor's worker threads are never stalled.
//!
//! ## Why Otsu and not a fixed threshold?
//!
//! Receipt photos vary wildly in exposure: thermal paper under warm indoor
//! light reads very differently from a flash photo. A fixed cut-off that
//! works for one photo turns another all-black. Otsu's method picks the
//! threshold from each image's own intensity histogram, so the separation
//! between ink and paper is recomputed per image.

use crate::error::ScanError;
use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use std::path::Path;
use tracing::debug;

/// A two-tone image plus the threshold that produced it.
///
/// Every pixel in `image` is either 0 (ink) or 255 (paper).
pub struct BinarizedImage {
    /// Single-channel image containing only the values 0 and 255.
    pub image: GrayImage,
    /// The Otsu level selected for this image.
    pub threshold: u8,
}

impl BinarizedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode the image at `path` and produce a two-tone version.
///
/// Runs inside `spawn_blocking` since decoding and thresholding are
/// CPU-bound.
pub async fn binarize(path: &Path) -> Result<BinarizedImage, ScanError> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || binarize_blocking(&path))
        .await
        .map_err(|e| ScanError::Internal(format!("Binarize task panicked: {}", e)))?
}

/// Blocking implementation of the binarize stage.
fn binarize_blocking(path: &Path) -> Result<BinarizedImage, ScanError> {
    let decoded = image::open(path).map_err(|e| ScanError::DecodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let gray = decoded.to_luma8();
    debug!(
        "Decoded {} ({}x{} px)",
        path.display(),
        gray.width(),
        gray.height()
    );

    Ok(binarize_gray(gray))
}

/// Threshold a grayscale image using its Otsu level.
///
/// Pure function of the pixel data: same grayscale input always yields the
/// same two-tone output.
pub fn binarize_gray(gray: GrayImage) -> BinarizedImage {
    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::Binary);
    debug!("Otsu threshold: {}", level);

    BinarizedImage {
        image: binary,
        threshold: level,
    }
}
