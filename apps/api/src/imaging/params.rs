//! Parameter types for normalization.
//!
//! - [`Quality`]: lossy encoding quality in (0, 1], default 0.7.
//! - [`NormalizeParams`]: maximum output width (default 800) plus quality.

use super::ImageError;

pub const DEFAULT_MAX_WIDTH: u32 = 800;
pub const DEFAULT_QUALITY: f32 = 0.7;

/// Lossy encoding quality as a fraction in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Result<Self, ImageError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ImageError::InvalidQuality(value))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// The same quality on the JPEG encoder's 1–100 scale.
    pub fn jpeg_quality(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeParams {
    pub max_width: u32,
    pub quality: Quality,
}

impl NormalizeParams {
    pub fn new(max_width: u32, quality: f32) -> Result<Self, ImageError> {
        if max_width == 0 {
            return Err(ImageError::InvalidMaxWidth);
        }
        Ok(Self {
            max_width,
            quality: Quality::new(quality)?,
        })
    }
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: Quality::default(),
        }
    }
}
