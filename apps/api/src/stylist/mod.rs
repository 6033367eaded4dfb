//! Stylist domain: body type diagnosis, weather, outfit suggestion and speech.
//!
//! Every model call goes through the shared [`GeminiClient`](crate::llm_client::GeminiClient);
//! the quiz and location fallback are local.

pub mod diagnosis;
pub mod flow;
pub mod handlers;
pub mod location;
pub mod models;
pub mod outfit;
pub mod prompts;
pub mod quiz;
pub mod schemas;
pub mod speech;
pub mod weather;
