use crate::config::Config;
use crate::llm_client::GeminiClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one Gemini client for the whole process; clones share its connection pool.
    pub llm: GeminiClient,
    pub config: Config,
}
