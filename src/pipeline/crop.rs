//! Title-region crop: keep the top quarter of the photo, full width.
//!
//! Both supported games print the card name at the top of the frame. Feeding
//! only that band to the OCR engine removes rules text, artwork, and set
//! symbols that would otherwise compete for the first recognised line.
//!
//! Cropping is best-effort. If the image cannot be decoded or is too small to
//! crop, [`crop_or_original`] hands back the original untouched and the OCR
//! engine gets a chance with the full photo.

use crate::error::PreprocessError;
use crate::pipeline::input::RawImage;
use image::DynamicImage;
use tracing::{debug, warn};

/// Crop rectangle `(x, y, width, height)` for the title band.
///
/// Height is `floor(height * ratio)`.
pub fn title_region(width: u32, height: u32, ratio: f32) -> (u32, u32, u32, u32) {
    let crop_height = (height as f64 * ratio as f64).floor() as u32;
    (0, 0, width, crop_height.min(height))
}

/// Decode `image` and crop it to the title band.
pub fn crop(image: &RawImage, ratio: f32) -> Result<DynamicImage, PreprocessError> {
    let decoded = image.decode()?;
    let (x, y, w, h) = title_region(decoded.width(), decoded.height(), ratio);
    if w == 0 || h == 0 {
        return Err(PreprocessError::TooSmall {
            width: decoded.width(),
            height: decoded.height(),
        });
    }
    debug!(
        "Cropping {}x{} → {}x{} title region",
        decoded.width(),
        decoded.height(),
        w,
        h
    );
    Ok(decoded.crop_imm(x, y, w, h))
}

/// Result of preprocessing: the image for OCR and whether the crop applied.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub image: RawImage,
    pub cropped: bool,
}

/// Crop to the title band, falling back to the original on any failure.
///
/// Never returns an error.
pub fn crop_or_original(image: &RawImage, ratio: f32) -> PreparedImage {
    match crop(image, ratio) {
        Ok(cropped) => PreparedImage {
            image: RawImage::Bitmap(cropped),
            cropped: true,
        },
        Err(e) => {
            warn!("Title crop failed, using full image: {}", e);
            PreparedImage {
                image: image.clone(),
                cropped: false,
            }
        }
    }
}
