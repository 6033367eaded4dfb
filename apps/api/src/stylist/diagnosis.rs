//! Photo-based body type diagnosis.

use serde::Deserialize;
use tracing::info;

use crate::imaging::CompressedImage;
use crate::llm_client::prompts::language_instruction;
use crate::llm_client::{GeminiClient, LlmError, RemoteRequest};
use crate::stylist::models::{BodyType, BodyTypeDiagnosis, DiagnosisSource};
use crate::stylist::prompts::{fill, DIAGNOSIS_PROMPT, STYLIST_SYSTEM};
use crate::stylist::schemas::diagnosis_schema;

/// What the model returns for a diagnosis call.
#[derive(Debug, Deserialize)]
struct DiagnosisReply {
    #[serde(rename = "type")]
    body_type: BodyType,
    reason: String,
}

/// Sends the normalized photo to the model and reads back a frame category.
///
/// `model` overrides the client's default text model, for deployments that
/// route vision calls elsewhere.
pub async fn diagnose_photo(
    llm: &GeminiClient,
    image: &CompressedImage,
    language: &str,
    model: Option<&str>,
) -> Result<BodyTypeDiagnosis, LlmError> {
    let instruction = language_instruction(language);
    let prompt = fill(
        DIAGNOSIS_PROMPT,
        &[("language_instruction", instruction.as_str())],
    );

    let mut request = RemoteRequest::new(prompt)
        .with_system(STYLIST_SYSTEM)
        .with_attachment(image.mime_type(), image.bytes())
        .with_schema(diagnosis_schema());
    if let Some(model) = model {
        request = request.with_model(model);
    }

    let reply: DiagnosisReply = llm.generate_json(&request).await?;
    let (width, height) = image.dimensions();
    info!("Photo diagnosis ({width}x{height}): {}", reply.body_type);

    Ok(BodyTypeDiagnosis {
        body_type: reply.body_type,
        reason: reply.reason,
        source: DiagnosisSource::Photo,
    })
}
