//! Image byte helpers: `data:` URI decoding and PNG/base64 encoding.
//!
//! Camera widgets hand us base64 data URIs, file pickers hand us raw bytes,
//! and the vision backend wants base64 PNG. PNG is used on the way out
//! because it is lossless; JPEG ringing around small title glyphs hurts
//! recognition more than the extra bytes cost.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Decode the payload of a base64 `data:` URI (`data:image/jpeg;base64,...`).
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URI has no ',' separator".to_string())?;
    if !header.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err("only base64 data URIs are supported".to_string());
    }
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| format!("invalid base64 payload: {e}"))
}

/// PNG-encode an image.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode an image as a base64 PNG attachment for a vision model.
///
/// `detail: "high"` keeps the small title glyphs legible; the low-detail
/// mode downsamples to a single 512 px tile.
pub fn encode_for_vision(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let b64 = STANDARD.encode(encode_png(img)?);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
