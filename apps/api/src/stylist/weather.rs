//! Weather lookup through the model with search grounding.

use chrono::NaiveDate;
use tracing::info;

use crate::llm_client::prompts::{language_instruction, JSON_ONLY_SYSTEM};
use crate::llm_client::{GeminiClient, LlmError, RemoteRequest};
use crate::stylist::models::{Coordinates, WeatherData};
use crate::stylist::prompts::{fill, WEATHER_PROMPT_TEMPLATE};
use crate::stylist::schemas::weather_schema;

/// Where to look up the weather.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLocation {
    Place(String),
    Coordinates(Coordinates),
}

impl WeatherLocation {
    fn describe(&self) -> String {
        match self {
            WeatherLocation::Place(name) => name.clone(),
            WeatherLocation::Coordinates(c) => {
                format!("latitude {:.4}, longitude {:.4}", c.latitude, c.longitude)
            }
        }
    }
}

/// Asks the model for the forecast at `location` on `date`.
/// The requested date is echoed into the result.
pub async fn fetch_weather(
    llm: &GeminiClient,
    location: &WeatherLocation,
    date: NaiveDate,
    language: &str,
) -> Result<WeatherData, LlmError> {
    let place = location.describe();
    let date_text = date.format("%Y-%m-%d").to_string();
    let instruction = language_instruction(language);
    let prompt = fill(
        WEATHER_PROMPT_TEMPLATE,
        &[
            ("location", place.as_str()),
            ("date", date_text.as_str()),
            ("language_instruction", instruction.as_str()),
        ],
    );

    let request = RemoteRequest::new(prompt)
        .with_system(JSON_ONLY_SYSTEM)
        .with_schema(weather_schema())
        .with_search_grounding();

    let mut weather: WeatherData = llm.generate_json(&request).await?;
    weather.date = Some(date);

    info!(
        "Weather for {} on {}: {} {}°C",
        place, date_text, weather.condition, weather.temp
    );
    Ok(weather)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{gemini_text_response, test_client};
    use mockito::Matcher;
    use serde_json::json;

    const SUNNY: &str = r#"{"city":"Tokyo","temp":24.5,"condition":"Sunny","humidity":40,"description":"Pleasant"}"#;

    #[tokio::test]
    async fn weather_request_enables_search_and_echoes_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/test-model:generateContent")
            .match_body(Matcher::PartialJson(json!({ "tools": [{ "googleSearch": {} }] })))
            .with_status(200)
            .with_body(gemini_text_response(SUNNY))
            .create_async()
            .await;

        let llm = test_client(&server.url(), 1);
        let date = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        let weather = fetch_weather(
            &llm,
            &WeatherLocation::Place("Tokyo".to_string()),
            date,
            "English",
        )
        .await
        .unwrap();

        assert_eq!(weather.city, "Tokyo");
        assert_eq!(weather.temp, 24.5);
        assert_eq!(weather.humidity, 40.0);
        assert_eq!(weather.date, Some(date));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn coordinates_are_written_into_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/test-model:generateContent")
            .match_body(Matcher::Regex("latitude 35\\.6895, longitude 139\\.6917".to_string()))
            .with_status(200)
            .with_body(gemini_text_response(SUNNY))
            .create_async()
            .await;

        let llm = test_client(&server.url(), 1);
        let location = WeatherLocation::Coordinates(Coordinates {
            latitude: 35.6895,
            longitude: 139.6917,
        });
        fetch_weather(&llm, &location, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), "English")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_humidity_is_schema_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/test-model:generateContent")
            .with_status(200)
            .with_body(gemini_text_response(
                r#"{"city":"Tokyo","temp":20,"condition":"Rain","description":"Wet"}"#,
            ))
            .create_async()
            .await;

        let llm = test_client(&server.url(), 1);
        let err = fetch_weather(
            &llm,
            &WeatherLocation::Place("Tokyo".to_string()),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            "English",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LlmError::Schema(ref m) if m.contains("humidity")), "{err}");
    }
}
