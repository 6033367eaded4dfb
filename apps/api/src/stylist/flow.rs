//! The full styling run: diagnosis → location/weather → outfit → optional speech.
//!
//! Stages run strictly in order. Each stage's output feeds the next, so there
//! is nothing to overlap; a failed stage aborts the run, except speech, whose
//! failure is reported inside the response.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::imaging::normalize::CompressedImageSummary;
use crate::imaging::{normalize_upload, ImageUpload};
use crate::llm_client::LlmError;
use crate::state::AppState;
use crate::stylist::diagnosis::diagnose_photo;
use crate::stylist::location::{locate_or_fallback, ReportedLocation};
use crate::stylist::models::{
    BodyType, BodyTypeDiagnosis, Coordinates, DiagnosisSource, OutfitSuggestion, WeatherData,
};
use crate::stylist::outfit::{suggest_outfit, OutfitContext};
use crate::stylist::quiz::diagnose_from_answers;
use crate::stylist::speech::{synthesize, SpeechOutcome};
use crate::stylist::weather::{fetch_weather, WeatherLocation};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StylingRequest {
    /// `data:image/...;base64,...`
    #[serde(default)]
    pub image_data_url: Option<String>,
    #[serde(default)]
    pub quiz_answers: Option<Vec<BodyType>>,
    #[serde(default)]
    pub body_type: Option<BodyType>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub with_audio: bool,
}

/// How the body type is determined for a run. Exactly one per request.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosisInput {
    Photo(String),
    Quiz(Vec<BodyType>),
    Declared(BodyType),
}

impl StylingRequest {
    pub fn diagnosis_input(&self) -> Result<DiagnosisInput, AppError> {
        let mut inputs = Vec::with_capacity(1);
        if let Some(url) = &self.image_data_url {
            inputs.push(DiagnosisInput::Photo(url.clone()));
        }
        if let Some(answers) = &self.quiz_answers {
            inputs.push(DiagnosisInput::Quiz(answers.clone()));
        }
        if let Some(body_type) = self.body_type {
            inputs.push(DiagnosisInput::Declared(body_type));
        }

        match inputs.len() {
            1 => Ok(inputs.remove(0)),
            0 => Err(AppError::Validation(
                "one of image_data_url, quiz_answers or body_type is required".to_string(),
            )),
            _ => Err(AppError::Validation(
                "only one of image_data_url, quiz_answers or body_type may be given".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Diagnosis,
    Weather,
    Outfit,
    Speech,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStage::Diagnosis => "diagnosis",
            FlowStage::Weather => "weather",
            FlowStage::Outfit => "outfit",
            FlowStage::Speech => "speech",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize)]
pub struct StylingResponse {
    pub styling_id: Uuid,
    pub diagnosis: BodyTypeDiagnosis,
    pub weather: WeatherData,
    pub outfit: OutfitSuggestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<CompressedImageSummary>,
}

/// Weather for a place name if one is given, otherwise for the reported
/// coordinates (or the fallback coordinate).
pub async fn resolve_weather(
    state: &AppState,
    location: Option<&str>,
    coordinates: Option<Coordinates>,
    date: NaiveDate,
) -> Result<WeatherData, LlmError> {
    let location = match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(place) => WeatherLocation::Place(place.to_string()),
        None => {
            WeatherLocation::Coordinates(locate_or_fallback(&ReportedLocation(coordinates)).await)
        }
    };
    fetch_weather(&state.llm, &location, date, &state.config.response_language).await
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn run_styling_flow(
    state: &AppState,
    request: StylingRequest,
) -> Result<StylingResponse, AppError> {
    let styling_id = Uuid::new_v4();
    let config = &state.config;
    let input = request.diagnosis_input()?;
    let date = request.date.unwrap_or_else(today);

    info!("Styling {styling_id}: stage {}", FlowStage::Diagnosis);
    let (diagnosis, image) = match input {
        DiagnosisInput::Photo(url) => {
            let upload = ImageUpload::from_data_url(&url, config.max_upload_bytes)?;
            let image = normalize_upload(upload, config.normalize).await?;
            let diagnosis = diagnose_photo(
                &state.llm,
                &image,
                &config.response_language,
                config.gemini_vision_model.as_deref(),
            )
            .await?;
            (diagnosis, Some(image.summary()))
        }
        DiagnosisInput::Quiz(answers) => (diagnose_from_answers(&answers)?, None),
        DiagnosisInput::Declared(body_type) => (
            BodyTypeDiagnosis {
                body_type,
                reason: "Declared by the user".to_string(),
                source: DiagnosisSource::Declared,
            },
            None,
        ),
    };

    info!("Styling {styling_id}: stage {}", FlowStage::Weather);
    let weather =
        resolve_weather(state, request.location.as_deref(), request.coordinates, date).await?;

    info!("Styling {styling_id}: stage {}", FlowStage::Outfit);
    let context = OutfitContext {
        body_type: diagnosis.body_type,
        weather: &weather,
        mood: request.mood.as_deref(),
        date,
    };
    let outfit = suggest_outfit(
        &state.llm,
        &context,
        &config.response_language,
        &config.shopping_search_url,
    )
    .await?;

    let speech = if request.with_audio {
        info!("Styling {styling_id}: stage {}", FlowStage::Speech);
        let outcome = if outfit.audio_text.trim().is_empty() {
            SpeechOutcome::Failed {
                message: "outfit has no spoken summary".to_string(),
            }
        } else {
            SpeechOutcome::from_result(
                synthesize(&state.llm, &outfit.audio_text, &config.tts_voice).await,
            )
        };
        Some(outcome)
    } else {
        None
    };

    info!(
        "Styling {styling_id} complete: {} / {}",
        diagnosis.body_type, outfit.title
    );

    Ok(StylingResponse {
        styling_id,
        diagnosis,
        weather,
        outfit,
        speech,
        image,
    })
}
