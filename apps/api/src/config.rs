use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::imaging::params::{DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use crate::imaging::upload::MAX_UPLOAD_BYTES;
use crate::imaging::NormalizeParams;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::{GeminiSettings, DEFAULT_BASE_URL};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value is out of range.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// Model used for photo diagnosis. Falls back to `gemini_model`.
    pub gemini_vision_model: Option<String>,
    pub gemini_tts_model: String,
    pub tts_voice: String,
    pub retry: RetryPolicy,
    pub normalize: NormalizeParams,
    pub max_upload_bytes: usize,
    pub response_language: String,
    /// Shop search URL with a `{query}` placeholder.
    pub shopping_search_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Tests pass a map here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let max_attempts: u32 = env.parse_or("RETRY_MAX_ATTEMPTS", 5)?;
        let initial_delay_ms: u64 = env.parse_or("RETRY_INITIAL_DELAY_MS", 10_000)?;
        let multiplier: f64 = env.parse_or("RETRY_BACKOFF_MULTIPLIER", 2.0)?;
        let max_delay_ms: u64 = env.parse_or("RETRY_MAX_DELAY_MS", 60_000)?;
        let jitter: bool = env.parse_or("RETRY_JITTER", true)?;

        let mut retry = RetryPolicy::new(
            max_attempts,
            Duration::from_millis(initial_delay_ms),
            multiplier,
        )
        .map_err(|e| anyhow!("Invalid retry policy: {e}"))?
        .with_jitter(jitter);
        if max_delay_ms > 0 {
            retry = retry.with_max_delay(Duration::from_millis(max_delay_ms));
        }

        let normalize = NormalizeParams::new(
            env.parse_or("IMAGE_MAX_WIDTH", DEFAULT_MAX_WIDTH)?,
            env.parse_or("IMAGE_QUALITY", DEFAULT_QUALITY)?,
        )
        .map_err(|e| anyhow!("Invalid image settings: {e}"))?;

        let shopping_search_url = env.string_or(
            "SHOPPING_SEARCH_URL",
            "https://search.rakuten.co.jp/search/mall/{query}/",
        );
        if !shopping_search_url.contains("{query}") {
            return Err(anyhow!("SHOPPING_SEARCH_URL must contain a '{{query}}' placeholder"));
        }

        Ok(Config {
            gemini_api_key: env.require("GEMINI_API_KEY")?,
            gemini_base_url: env.string_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            gemini_model: env.string_or("GEMINI_MODEL", "gemini-2.0-flash"),
            gemini_vision_model: env.get("GEMINI_VISION_MODEL"),
            gemini_tts_model: env.string_or("GEMINI_TTS_MODEL", "gemini-2.5-flash-preview-tts"),
            tts_voice: env.string_or("GEMINI_TTS_VOICE", "Kore"),
            retry,
            normalize,
            max_upload_bytes: env.parse_or("MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES)?,
            response_language: env.string_or("RESPONSE_LANGUAGE", "Japanese"),
            shopping_search_url,
            port: env
                .parse_or("PORT", 8080u16)
                .context("PORT must be a valid port number")?,
            rust_log: env.string_or("RUST_LOG", "info"),
        })
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            api_key: self.gemini_api_key.clone(),
            base_url: self.gemini_base_url.clone(),
            text_model: self.gemini_model.clone(),
            speech_model: self.gemini_tts_model.clone(),
            retry: self.retry.clone(),
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Set and non-blank.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow!("{key}='{raw}' is invalid: {e}")),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = config_from(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(config.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.gemini_vision_model, None);
        assert_eq!(config.tts_voice, "Kore");
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.normalize, NormalizeParams::default());
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.port, 8080);
        assert_eq!(config.response_language, "Japanese");
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        assert!(config_from(&[("GEMINI_API_KEY", "   ")]).is_err());
    }

    #[test]
    fn retry_settings_are_read() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "k"),
            ("RETRY_MAX_ATTEMPTS", "3"),
            ("RETRY_INITIAL_DELAY_MS", "500"),
            ("RETRY_BACKOFF_MULTIPLIER", "1.5"),
            ("RETRY_MAX_DELAY_MS", "0"),
            ("RETRY_JITTER", "false"),
        ])
        .unwrap();
        let expected = RetryPolicy::new(3, Duration::from_millis(500), 1.5).unwrap();
        assert_eq!(config.retry, expected);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (key, value) in [
            ("RETRY_MAX_ATTEMPTS", "0"),
            ("RETRY_BACKOFF_MULTIPLIER", "1.0"),
            ("IMAGE_QUALITY", "1.5"),
            ("IMAGE_MAX_WIDTH", "0"),
            ("PORT", "70000"),
            ("SHOPPING_SEARCH_URL", "https://shop.example.com/"),
        ] {
            assert!(
                config_from(&[("GEMINI_API_KEY", "k"), (key, value)]).is_err(),
                "{key}={value}"
            );
        }
    }

    #[test]
    fn settings_carry_models_and_policy() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_TTS_MODEL", "tts"),
            ("GEMINI_VISION_MODEL", "vision"),
        ])
        .unwrap();
        let settings = config.gemini_settings();
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.speech_model, "tts");
        assert_eq!(settings.retry, config.retry);
        assert_eq!(config.gemini_vision_model.as_deref(), Some("vision"));
    }
}
