//! Decode → bound width → JPEG re-encode.
//!
//! Decoding accepts anything the compiled-in `image` decoders understand
//! (JPEG, PNG, WebP, GIF). The output is always a baseline JPEG, since that is
//! what the model endpoint handles most cheaply.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::Serialize;
use tracing::debug;

use super::calculations::constrain_to_width;
use super::params::{NormalizeParams, Quality};
use super::upload::ImageUpload;
use super::ImageError;

const JPEG_MIME: &str = "image/jpeg";

/// A lossy-encoded image ready to be attached to a remote request.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    bytes: Bytes,
    quality: Quality,
    width: u32,
    height: u32,
}

/// What the API reports back about a normalized upload.
#[derive(Debug, Clone, Serialize)]
pub struct CompressedImageSummary {
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
    pub quality: f32,
}

impl CompressedImage {
    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME
    }

    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn summary(&self) -> CompressedImageSummary {
        CompressedImageSummary {
            mime_type: JPEG_MIME,
            width: self.width,
            height: self.height,
            byte_size: self.bytes.len(),
            quality: self.quality.value(),
        }
    }
}

/// Decodes `input`, shrinks it to `params.max_width` if wider, and re-encodes it as JPEG.
///
/// Fails with [`ImageError::Decode`] when `input` is not a readable image; an
/// unreadable input never yields an empty output.
pub fn normalize_image(
    input: &[u8],
    params: &NormalizeParams,
) -> Result<CompressedImage, ImageError> {
    let decoded = image::load_from_memory(input).map_err(ImageError::Decode)?;
    let (source_width, source_height) = (decoded.width(), decoded.height());
    let (width, height) = constrain_to_width(source_width, source_height, params.max_width);

    let resized = if (width, height) == (source_width, source_height) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let mut encoded = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut encoded, params.quality.jpeg_quality())
        .encode_image(&rgb)
        .map_err(ImageError::Encode)?;
    let encoded = encoded.into_inner();

    debug!(
        "Normalized image {}x{} ({} bytes) → {}x{} ({} bytes, q={})",
        source_width,
        source_height,
        input.len(),
        width,
        height,
        encoded.len(),
        params.quality.jpeg_quality()
    );

    Ok(CompressedImage {
        bytes: Bytes::from(encoded),
        quality: params.quality,
        width,
        height,
    })
}

/// Runs [`normalize_image`] on the blocking pool so decode work never stalls the runtime.
pub async fn normalize_upload(
    upload: ImageUpload,
    params: NormalizeParams,
) -> Result<CompressedImage, ImageError> {
    tokio::task::spawn_blocking(move || normalize_image(&upload.bytes, &params))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
}
