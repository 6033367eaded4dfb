//! Axum route handlers for the stylist API.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::imaging::normalize::CompressedImageSummary;
use crate::imaging::{normalize_upload, ImageUpload};
use crate::llm_client::ModelInfo;
use crate::state::AppState;
use crate::stylist::diagnosis::diagnose_photo;
use crate::stylist::flow::{resolve_weather, run_styling_flow, today, StylingRequest, StylingResponse};
use crate::stylist::models::{BodyType, BodyTypeDiagnosis, Coordinates, OutfitSuggestion, WeatherData};
use crate::stylist::outfit::{suggest_outfit, OutfitContext};
use crate::stylist::quiz::{diagnose_from_answers, find_question, QuizQuestion, QUIZ_QUESTIONS};
use crate::stylist::speech::synthesize;

/// Multipart field carrying the photo.
const IMAGE_FIELD: &str = "image";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub questions: &'static [QuizQuestion],
}

#[derive(Debug, Deserialize)]
pub struct QuizDiagnosisRequest {
    pub answers: Vec<BodyType>,
}

#[derive(Debug, Serialize)]
pub struct PhotoDiagnosisResponse {
    pub diagnosis: BodyTypeDiagnosis,
    pub image: CompressedImageSummary,
}

#[derive(Debug, Deserialize)]
pub struct WeatherRequest {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct OutfitRequest {
    pub body_type: BodyType,
    /// Already-known weather. When absent, it is looked up from the location.
    #[serde(default)]
    pub weather: Option<WeatherData>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub mood: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutfitResponse {
    pub weather: WeatherData,
    pub outfit: OutfitSuggestion,
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/quiz
pub async fn handle_get_quiz() -> Json<QuizResponse> {
    Json(QuizResponse {
        questions: &QUIZ_QUESTIONS,
    })
}

/// GET /api/v1/quiz/:id
pub async fn handle_get_question(Path(id): Path<u32>) -> Result<Json<QuizQuestion>, AppError> {
    find_question(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("quiz question {id}")))
}

/// POST /api/v1/diagnosis/quiz
pub async fn handle_quiz_diagnosis(
    Json(request): Json<QuizDiagnosisRequest>,
) -> Result<Json<BodyTypeDiagnosis>, AppError> {
    Ok(Json(diagnose_from_answers(&request.answers)?))
}

/// POST /api/v1/diagnosis/photo
///
/// Multipart upload with the photo in the `image` field. The photo is
/// validated, normalized, then classified by the model.
pub async fn handle_photo_diagnosis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PhotoDiagnosisResponse>, AppError> {
    let config = &state.config;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some(ImageUpload::new(mime_type, bytes, config.max_upload_bytes)?);
        break;
    }

    let upload = upload
        .ok_or_else(|| AppError::Validation(format!("multipart field '{IMAGE_FIELD}' is required")))?;
    let image = normalize_upload(upload, config.normalize).await?;
    let diagnosis = diagnose_photo(
        &state.llm,
        &image,
        &config.response_language,
        config.gemini_vision_model.as_deref(),
    )
    .await?;

    Ok(Json(PhotoDiagnosisResponse {
        diagnosis,
        image: image.summary(),
    }))
}

/// POST /api/v1/weather
pub async fn handle_weather(
    State(state): State<AppState>,
    Json(request): Json<WeatherRequest>,
) -> Result<Json<WeatherData>, AppError> {
    let date = request.date.unwrap_or_else(today);
    let weather = resolve_weather(
        &state,
        request.location.as_deref(),
        request.coordinates,
        date,
    )
    .await?;
    Ok(Json(weather))
}

/// POST /api/v1/outfits
pub async fn handle_outfit(
    State(state): State<AppState>,
    Json(request): Json<OutfitRequest>,
) -> Result<Json<OutfitResponse>, AppError> {
    let date = request
        .date
        .or_else(|| request.weather.as_ref().and_then(|w| w.date))
        .unwrap_or_else(today);

    let weather = match request.weather {
        Some(weather) => weather,
        None => {
            resolve_weather(
                &state,
                request.location.as_deref(),
                request.coordinates,
                date,
            )
            .await?
        }
    };

    let context = OutfitContext {
        body_type: request.body_type,
        weather: &weather,
        mood: request.mood.as_deref(),
        date,
    };
    let outfit = suggest_outfit(
        &state.llm,
        &context,
        &state.config.response_language,
        &state.config.shopping_search_url,
    )
    .await?;

    Ok(Json(OutfitResponse { weather, outfit }))
}

/// POST /api/v1/speech
///
/// Returns a playable `audio/wav` body.
pub async fn handle_speech(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    let voice = request
        .voice
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(&state.config.tts_voice);

    let clip = synthesize(&state.llm, &request.text, voice).await?;
    let wav: Bytes = clip.to_wav();

    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav))
}

/// POST /api/v1/styling
///
/// Runs the whole styling flow in one request.
pub async fn handle_styling(
    State(state): State<AppState>,
    Json(request): Json<StylingRequest>,
) -> Result<Json<StylingResponse>, AppError> {
    Ok(Json(run_styling_flow(&state, request).await?))
}

/// GET /api/v1/models
pub async fn handle_list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, AppError> {
    let models = state.llm.list_models().await?;
    Ok(Json(ModelsResponse { models }))
}
