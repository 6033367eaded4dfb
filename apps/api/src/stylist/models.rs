use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Skeletal frame category used to tailor outfit suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyType {
    Straight,
    Wave,
    Natural,
}

impl BodyType {
    /// Declaration order; quiz ties resolve towards the later entry.
    pub const ALL: [BodyType; 3] = [BodyType::Straight, BodyType::Wave, BodyType::Natural];

    pub fn as_str(self) -> &'static str {
        match self {
            BodyType::Straight => "Straight",
            BodyType::Wave => "Wave",
            BodyType::Natural => "Natural",
        }
    }

    /// The frame trait the stylist prompt emphasises for this type.
    pub fn styling_focus(self) -> &'static str {
        match self {
            BodyType::Straight => "a three-dimensional, toned frame; favour clean lines and simple structure",
            BodyType::Wave => "soft curves and a delicate upper body; favour light fabrics and a raised waistline",
            BodyType::Natural => "a prominent bone frame; favour relaxed silhouettes and textured materials",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisSource {
    Photo,
    Quiz,
    Declared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyTypeDiagnosis {
    pub body_type: BodyType,
    pub reason: String,
    pub source: DiagnosisSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Weather at the styling location, as reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub city: String,
    /// Degrees Celsius.
    pub temp: f64,
    pub condition: String,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    pub description: String,
    pub search_keyword: String,
    pub shopping_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitSuggestion {
    pub body_type: BodyType,
    pub title: String,
    pub items: Vec<RecommendedItem>,
    pub tips: String,
    pub reason: String,
    /// Short script meant to be read aloud by speech synthesis.
    pub audio_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_type_serializes_as_capitalized_label() {
        assert_eq!(serde_json::to_string(&BodyType::Wave).unwrap(), "\"Wave\"");
        let parsed: BodyType = serde_json::from_str("\"Natural\"").unwrap();
        assert_eq!(parsed, BodyType::Natural);
    }

    #[test]
    fn body_type_rejects_unknown_labels() {
        assert!(serde_json::from_str::<BodyType>("\"Round\"").is_err());
        assert!(serde_json::from_str::<BodyType>("\"wave\"").is_err());
    }

    #[test]
    fn coordinates_range_check() {
        assert!(Coordinates { latitude: 35.6895, longitude: 139.6917 }.is_valid());
        assert!(!Coordinates { latitude: 91.0, longitude: 0.0 }.is_valid());
        assert!(!Coordinates { latitude: 0.0, longitude: -180.5 }.is_valid());
        assert!(!Coordinates { latitude: f64::NAN, longitude: 0.0 }.is_valid());
    }

    #[test]
    fn weather_without_date_deserializes() {
        let json = r#"{"city":"東京","temp":22,"condition":"晴れ","humidity":45,"description":"過ごしやすい"}"#;
        let weather: WeatherData = serde_json::from_str(json).unwrap();
        assert_eq!(weather.city, "東京");
        assert_eq!(weather.temp, 22.0);
        assert!(weather.date.is_none());
        assert!(!serde_json::to_string(&weather).unwrap().contains("date"));
    }
}
