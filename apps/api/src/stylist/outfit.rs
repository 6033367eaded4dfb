//! Outfit generation for a body type and the day's weather.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::llm_client::prompts::language_instruction;
use crate::llm_client::{GeminiClient, LlmError, RemoteRequest};
use crate::stylist::models::{BodyType, OutfitSuggestion, RecommendedItem, WeatherData};
use crate::stylist::prompts::{fill, OUTFIT_PROMPT_TEMPLATE, STYLIST_SYSTEM};
use crate::stylist::schemas::outfit_schema;

/// Everything the outfit prompt is built from.
#[derive(Debug, Clone)]
pub struct OutfitContext<'a> {
    pub body_type: BodyType,
    pub weather: &'a WeatherData,
    pub mood: Option<&'a str>,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutfitDraft {
    title: String,
    items: Vec<ItemDraft>,
    tips: String,
    reason: String,
    audio_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemDraft {
    name: String,
    #[serde(default)]
    brand_name: Option<String>,
    description: String,
    search_keyword: String,
}

/// Shop search link for `keyword`. `template` carries a `{query}` placeholder.
pub fn shopping_url(template: &str, keyword: &str) -> String {
    template.replace("{query}", &urlencoding::encode(keyword.trim()))
}

pub async fn suggest_outfit(
    llm: &GeminiClient,
    context: &OutfitContext<'_>,
    language: &str,
    shopping_template: &str,
) -> Result<OutfitSuggestion, LlmError> {
    let weather = context.weather;
    let date = context.date.format("%Y-%m-%d").to_string();
    let temp = weather.temp.to_string();
    let humidity = weather.humidity.to_string();
    let instruction = language_instruction(language);
    let prompt = fill(
        OUTFIT_PROMPT_TEMPLATE,
        &[
            ("body_type", context.body_type.as_str()),
            ("styling_focus", context.body_type.styling_focus()),
            ("city", weather.city.as_str()),
            ("date", date.as_str()),
            ("condition", weather.condition.as_str()),
            ("temp", temp.as_str()),
            ("humidity", humidity.as_str()),
            ("weather_description", weather.description.as_str()),
            ("mood", context.mood.unwrap_or("no particular plans")),
            ("language_instruction", instruction.as_str()),
        ],
    );

    let request = RemoteRequest::new(prompt)
        .with_system(STYLIST_SYSTEM)
        .with_schema(outfit_schema());

    let draft: OutfitDraft = llm.generate_json(&request).await?;
    if draft.items.is_empty() {
        return Err(LlmError::Schema("$.items: outfit has no items".to_string()));
    }

    info!(
        "Outfit '{}' for {} with {} items",
        draft.title,
        context.body_type,
        draft.items.len()
    );

    let items = draft
        .items
        .into_iter()
        .map(|item| RecommendedItem {
            shopping_url: shopping_url(shopping_template, &item.search_keyword),
            name: item.name,
            brand_name: item.brand_name.filter(|b| !b.trim().is_empty()),
            description: item.description,
            search_keyword: item.search_keyword,
        })
        .collect();

    Ok(OutfitSuggestion {
        body_type: context.body_type,
        title: draft.title,
        items,
        tips: draft.tips,
        reason: draft.reason,
        audio_text: draft.audio_text,
    })
}
