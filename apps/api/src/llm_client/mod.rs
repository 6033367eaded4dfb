/// Gemini client: the single point of entry for all generative API calls in StyleCast.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// One `GeminiClient` is built at startup and handed to handlers through `AppState`.
///
/// Every outbound call runs inside `retry::retry_with_backoff`, so callers only ever
/// see terminal failures: non-transient errors, or transient ones that outlived the policy.
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use self::retry::{retry_with_backoff, Classify, FailureClass, RetryError, RetryPolicy};
use self::schema::Schema;

pub mod prompts;
pub mod retry;
pub mod schema;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure descriptions that mean "try again later" even when the status code does not.
const TRANSIENT_MARKERS: &[&str] = &[
    "rate limit",
    "overloaded",
    "unavailable",
    "try again later",
];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response does not match the declared schema: {0}")]
    Schema(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Invalid audio payload: {0}")]
    Audio(String),

    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LlmError>,
    },
}

impl LlmError {
    /// The call went through but its text could not be read as the declared schema.
    pub fn is_schema_failure(&self) -> bool {
        matches!(
            self,
            LlmError::Parse(_) | LlmError::Schema(_) | LlmError::EmptyContent
        )
    }
}

impl Classify for LlmError {
    fn classify(&self) -> FailureClass {
        match self {
            LlmError::Http(e) if e.is_timeout() || e.is_connect() => FailureClass::Transient,
            LlmError::Api { status, message }
                if is_transient_status(*status) || is_transient_message(message) =>
            {
                FailureClass::Transient
            }
            _ => FailureClass::Terminal,
        }
    }
}

impl From<RetryError<LlmError>> for LlmError {
    fn from(err: RetryError<LlmError>) -> Self {
        if err.exhausted {
            LlmError::RetriesExhausted {
                attempts: err.attempts,
                source: Box::new(err.source),
            }
        } else {
            err.source
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 503)
}

fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First inline binary part of the first candidate.
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    status: Option<String>,
}

/// A remote model as reported by the models listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Page size requested from the models listing.
const MODELS_PAGE_SIZE: &str = "1000";

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// Binary content sent inline with a prompt.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Bytes,
}

/// One logical generateContent call. Built once, then only read.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    prompt: String,
    system: Option<String>,
    model: Option<String>,
    attachment: Option<Attachment>,
    schema: Option<Schema>,
    search_grounding: bool,
}

impl RemoteRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model: None,
            attachment: None,
            schema: None,
            search_grounding: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Targets a specific model instead of the client's default text model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_attachment(mut self, mime_type: impl Into<String>, data: Bytes) -> Self {
        self.attachment = Some(Attachment {
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    /// Declares the JSON shape the model must answer with.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Lets the model consult Google Search before answering.
    pub fn with_search_grounding(mut self) -> Self {
        self.search_grounding = true;
        self
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    fn to_body(&self) -> GenerateContentBody {
        let mut parts = vec![Part {
            text: Some(self.prompt.clone()),
            inline_data: None,
        }];
        if let Some(attachment) = &self.attachment {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: attachment.mime_type.clone(),
                    data: BASE64.encode(&attachment.data),
                }),
            });
        }

        let generation_config = self.schema.as_ref().map(|schema| GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema.to_value()),
            ..GenerationConfig::default()
        });

        let tools = if self.search_grounding {
            vec![serde_json::json!({ "googleSearch": {} })]
        } else {
            Vec::new()
        };

        GenerateContentBody {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: self.system.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part {
                    text: Some(text.clone()),
                    inline_data: None,
                }],
            }),
            generation_config,
            tools,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Everything the client needs, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub speech_model: String,
    pub retry: RetryPolicy,
}

/// The single Gemini client used by all services in StyleCast.
/// Cloning shares the underlying connection pool and settings.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    settings: Arc<GeminiSettings>,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            settings: Arc::new(settings),
        })
    }

    pub fn text_model(&self) -> &str {
        &self.settings.text_model
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.settings.retry
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Runs one generateContent call with retry, returning the raw response.
    pub async fn generate(
        &self,
        request: &RemoteRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.settings.text_model);
        self.post_generate(model, &request.to_body()).await
    }

    /// Calls the model and deserializes its text reply as JSON.
    /// When the request declares a schema, the reply is checked against it first.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        request: &RemoteRequest,
    ) -> Result<T, LlmError> {
        let response = self.generate(request).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let value: Value = serde_json::from_str(strip_json_fences(&text))?;

        if let Some(schema) = request.schema() {
            schema.validate(&value).map_err(LlmError::Schema)?;
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Synthesizes `text` with a prebuilt voice and returns the raw PCM bytes
    /// (24 kHz, mono, signed 16-bit little-endian).
    pub async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<Vec<u8>, LlmError> {
        let body = GenerateContentBody {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(text.to_string()),
                    inline_data: None,
                }],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(serde_json::json!({
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                })),
                ..GenerationConfig::default()
            }),
            tools: Vec::new(),
        };

        let response = self.post_generate(&self.settings.speech_model, &body).await?;
        let audio = response.inline_data().ok_or(LlmError::EmptyContent)?;

        BASE64
            .decode(audio.data.as_bytes())
            .map_err(|e| LlmError::Audio(format!("base64 decode failed: {e}")))
    }

    /// Lists remote models that support generateContent, following
    /// `nextPageToken` until the listing is exhausted.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = self.url("models");
        let url = url.as_str();
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = page_token.as_deref();
            let listing: ListModelsResponse =
                retry_with_backoff(&self.settings.retry, move |attempt| {
                    debug!(attempt, page_token = ?token, "listing models");
                    let mut request = self
                        .client
                        .get(url)
                        .query(&[("pageSize", MODELS_PAGE_SIZE)]);
                    if let Some(token) = token {
                        request = request.query(&[("pageToken", token)]);
                    }
                    self.send(request)
                })
                .await?;

            models.extend(listing.models.into_iter().filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            }));

            match listing.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(models)
    }

    async fn post_generate(
        &self,
        model: &str,
        body: &GenerateContentBody,
    ) -> Result<GenerateContentResponse, LlmError> {
        let url = self.url(&format!("models/{model}:generateContent"));
        let url = url.as_str();

        let response: GenerateContentResponse =
            retry_with_backoff(&self.settings.retry, move |attempt| {
                debug!(attempt, model, "calling generateContent");
                self.send(self.client.post(url).json(body))
            })
            .await?;

        let finish_reason = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref());
        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Gemini call succeeded: model={}, finish_reason={:?}, prompt_tokens={:?}, output_tokens={:?}",
                model, finish_reason, usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(response)
    }

    /// One attempt: send, map non-2xx to `LlmError::Api`, parse the body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, LlmError> {
        let response = request
            .header("x-goog-api-key", &self.settings.api_key)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Prefer the structured error, keeping the status word for classification
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| match e.error.status {
                    Some(code) => format!("{code}: {}", e.error.message),
                    None => e.error.message,
                })
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
