//! Input resolution: turn a user-supplied path, data URI, or URL into a
//! [`RawImage`].
//!
//! The scan itself never touches the filesystem or network for the photo;
//! this is only for front ends (the CLI) that receive a string. Files and
//! downloads are sniffed with [`image::guess_format`] so a PDF or text file is
//! rejected here with a clear message instead of surfacing later as an OCR
//! failure.

use crate::error::{CardScanError, PreprocessError};
use crate::pipeline::encode::decode_data_uri;
use image::DynamicImage;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// A photo as handed to the pipeline. Immutable and single-use.
#[derive(Clone)]
pub enum RawImage {
    /// Already decoded (camera frame, test fixture).
    Bitmap(DynamicImage),
    /// Encoded file bytes (JPEG, PNG).
    Encoded(Vec<u8>),
    /// A base64 `data:` URI.
    DataUri(String),
}

impl RawImage {
    /// Decode to a bitmap.
    pub fn decode(&self) -> Result<DynamicImage, PreprocessError> {
        match self {
            RawImage::Bitmap(img) => Ok(img.clone()),
            RawImage::Encoded(bytes) => {
                image::load_from_memory(bytes).map_err(|e| PreprocessError::Decode(e.to_string()))
            }
            RawImage::DataUri(uri) => {
                let bytes = decode_data_uri(uri).map_err(PreprocessError::Decode)?;
                image::load_from_memory(&bytes).map_err(|e| PreprocessError::Decode(e.to_string()))
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RawImage::Bitmap(_) => "bitmap",
            RawImage::Encoded(_) => "encoded",
            RawImage::DataUri(_) => "data-uri",
        }
    }
}

impl fmt::Debug for RawImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawImage::Bitmap(img) => write!(f, "RawImage::Bitmap({}x{})", img.width(), img.height()),
            RawImage::Encoded(b) => write!(f, "RawImage::Encoded({} bytes)", b.len()),
            RawImage::DataUri(s) => write!(f, "RawImage::DataUri({} chars)", s.len()),
        }
    }
}

impl From<DynamicImage> for RawImage {
    fn from(img: DynamicImage) -> Self {
        RawImage::Bitmap(img)
    }
}

impl From<Vec<u8>> for RawImage {
    fn from(bytes: Vec<u8>) -> Self {
        RawImage::Encoded(bytes)
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve an input string to a [`RawImage`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<RawImage, CardScanError> {
    let image = if input.starts_with("data:") {
        RawImage::DataUri(input.to_string())
    } else if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    debug!("Resolved input as {}", image.kind());
    Ok(image)
}

async fn read_local(path_str: &str) -> Result<RawImage, CardScanError> {
    let path = PathBuf::from(path_str);
    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CardScanError::ImageNotFound { path: path.clone() },
        _ => CardScanError::InvalidInput {
            input: path_str.to_string(),
            reason: e.to_string(),
        },
    })?;
    ensure_image(path_str, &bytes)?;
    debug!("Read local image: {} ({} bytes)", path.display(), bytes.len());
    Ok(RawImage::Encoded(bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<RawImage, CardScanError> {
    info!("Downloading image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CardScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            CardScanError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            CardScanError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(CardScanError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CardScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    ensure_image(url, &bytes)?;
    info!("Downloaded {} bytes", bytes.len());
    Ok(RawImage::Encoded(bytes.to_vec()))
}

fn ensure_image(input: &str, bytes: &[u8]) -> Result<(), CardScanError> {
    image::guess_format(bytes)
        .map(|_| ())
        .map_err(|_| CardScanError::InvalidInput {
            input: input.to_string(),
            reason: "not a supported image (expected JPEG or PNG)".to_string(),
        })
}
