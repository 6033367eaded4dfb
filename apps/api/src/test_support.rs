//! Shared test utilities: in-memory images, canned Gemini replies, and
//! clients/state pointed at a mock server.

use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;

use crate::config::Config;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::{GeminiClient, GeminiSettings};
use crate::state::AppState;

// =========================================================================
// Images
// =========================================================================

/// RGB test card: horizontal and vertical gradients plus a fine XOR
/// pattern, so lossy encoders have detail to throw away.
pub fn sample_image(width: u32, height: u32) -> DynamicImage {
    let card = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x ^ y) & 0xFF) as u8,
        ])
    });
    DynamicImage::ImageRgb8(card)
}

pub fn encode_sample(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    sample_image(width, height)
        .write_to(&mut out, format)
        .unwrap_or_else(|e| panic!("failed to encode {format:?} sample: {e}"));
    out.into_inner()
}

pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    encode_sample(width, height, ImageFormat::Png)
}

// =========================================================================
// Gemini
// =========================================================================

/// Millisecond backoff, no ceiling, no jitter.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1), 2.0).unwrap()
}

/// A generateContent body whose first candidate carries `text`.
pub fn gemini_text_response(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

/// Client for a mock server: text model `test-model`, speech model `test-tts`.
pub fn test_client(base_url: &str, max_attempts: u32) -> GeminiClient {
    GeminiClient::new(GeminiSettings {
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        text_model: "test-model".to_string(),
        speech_model: "test-tts".to_string(),
        retry: fast_retry(max_attempts),
    })
    .unwrap()
}

// =========================================================================
// Application state
// =========================================================================

pub fn test_config(base_url: &str) -> Config {
    let base_url = base_url.to_string();
    let mut config = Config::from_lookup(|key| match key {
        "GEMINI_API_KEY" => Some("test-key".to_string()),
        "GEMINI_BASE_URL" => Some(base_url.clone()),
        "GEMINI_MODEL" => Some("test-model".to_string()),
        "GEMINI_TTS_MODEL" => Some("test-tts".to_string()),
        "RESPONSE_LANGUAGE" => Some("English".to_string()),
        _ => None,
    })
    .unwrap();
    config.retry = fast_retry(2);
    config
}

/// State whose client talks to `base_url` with two fast attempts per call.
pub fn test_state(base_url: &str) -> AppState {
    let config = test_config(base_url);
    let llm = GeminiClient::new(config.gemini_settings()).unwrap();
    AppState { llm, config }
}
