//! Image normalization: bounded re-encoding of uploads.
//!
//! Every photo is normalized before it is sent to the model, to keep request
//! payloads and model latency bounded.
//!
//! | Piece | Module |
//! |---|---|
//! | Target dimensions (pure math) | [`calculations`] |
//! | Quality / max-width parameters | [`params`] |
//! | Decode → resize → JPEG encode | [`normalize`] |
//! | MIME, size limit, data URLs | [`upload`] |

pub mod calculations;
pub mod normalize;
pub mod params;
pub mod upload;

pub use normalize::{normalize_upload, CompressedImage};
pub use params::NormalizeParams;
pub use upload::ImageUpload;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Decode failure: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Encode failure: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Unsupported media type '{0}': only image uploads are accepted")]
    UnsupportedMediaType(String),

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Malformed data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Quality must be in (0, 1], got {0}")]
    InvalidQuality(f32),

    #[error("Maximum width must be greater than zero")]
    InvalidMaxWidth,

    #[error("Image worker failed: {0}")]
    Worker(String),
}
