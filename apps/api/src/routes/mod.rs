pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::stylist::handlers;

/// Room for multipart framing or JSON around a base64 photo.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Largest request body accepted for a given upload limit. Base64 data URLs
/// are 4/3 the size of the image they carry.
fn request_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes.div_ceil(3) * 4 + BODY_OVERHEAD_BYTES
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = request_body_limit(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Diagnosis
        .route("/api/v1/quiz", get(handlers::handle_get_quiz))
        .route("/api/v1/quiz/:id", get(handlers::handle_get_question))
        .route(
            "/api/v1/diagnosis/quiz",
            post(handlers::handle_quiz_diagnosis),
        )
        .route(
            "/api/v1/diagnosis/photo",
            post(handlers::handle_photo_diagnosis),
        )
        // Weather, outfits, speech
        .route("/api/v1/weather", post(handlers::handle_weather))
        .route("/api/v1/outfits", post(handlers::handle_outfit))
        .route("/api/v1/speech", post(handlers::handle_speech))
        // Whole flow
        .route("/api/v1/styling", post(handlers::handle_styling))
        .route("/api/v1/models", get(handlers::handle_list_models))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
