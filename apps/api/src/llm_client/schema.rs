//! Declared response schemas for structured output.
//!
//! Gemini accepts an OpenAPI-style subset (`type`, `properties`, `required`,
//! `items`, `enum`). The same declaration is used to check the model's reply
//! before it is deserialized, so a missing required field surfaces as a schema
//! failure rather than a confusing serde error deep in a nested type.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Number,
    Array,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    variants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    property_ordering: Vec<String>,
}

impl Schema {
    fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            variants: Vec::new(),
            items: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            property_ordering: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    /// A string restricted to the given values.
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: values.into_iter().map(Into::into).collect(),
            ..Self::of(SchemaType::String)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a property the model must always return.
    pub fn required_property(mut self, name: &str, schema: Schema) -> Self {
        self.required.push(name.to_string());
        self.optional_property(name, schema)
    }

    pub fn optional_property(mut self, name: &str, schema: Schema) -> Self {
        self.property_ordering.push(name.to_string());
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Checks `value` against this schema. Returns the path and reason of the first mismatch.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), String> {
        let type_ok = match self.kind {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Array => value.is_array(),
            SchemaType::Object => value.is_object(),
        };
        if !type_ok {
            return Err(format!("{path}: expected {:?}, got {}", self.kind, kind_of(value)));
        }

        if !self.variants.is_empty() {
            let text = value.as_str().unwrap_or_default();
            if !self.variants.iter().any(|v| v == text) {
                return Err(format!(
                    "{path}: '{text}' is not one of [{}]",
                    self.variants.join(", ")
                ));
            }
        }

        if let (Some(items), Some(elements)) = (&self.items, value.as_array()) {
            for (i, element) in elements.iter().enumerate() {
                items.validate_at(element, &format!("{path}[{i}]"))?;
            }
        }

        if let Some(object) = value.as_object() {
            for name in &self.required {
                match object.get(name) {
                    None | Some(Value::Null) => {
                        return Err(format!("{path}.{name}: required field is missing"));
                    }
                    Some(_) => {}
                }
            }
            for (name, schema) in &self.properties {
                match object.get(name) {
                    None | Some(Value::Null) => {}
                    Some(field) => schema.validate_at(field, &format!("{path}.{name}"))?,
                }
            }
        }

        Ok(())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_like() -> Schema {
        Schema::object()
            .required_property("city", Schema::string())
            .required_property("temp", Schema::number())
            .optional_property("tags", Schema::array(Schema::string()))
    }

    #[test]
    fn test_schema_serializes_in_gemini_shape() {
        let value = weather_like().to_value();
        assert_eq!(value["type"], "OBJECT");
        assert_eq!(value["properties"]["city"]["type"], "STRING");
        assert_eq!(value["properties"]["tags"]["items"]["type"], "STRING");
        assert_eq!(value["required"], json!(["city", "temp"]));
        assert_eq!(value["propertyOrdering"], json!(["city", "temp", "tags"]));
        assert!(value.get("enum").is_none());
    }

    #[test]
    fn test_enum_schema_serializes_variants() {
        let value = Schema::one_of(["Straight", "Wave"]).to_value();
        assert_eq!(value["type"], "STRING");
        assert_eq!(value["enum"], json!(["Straight", "Wave"]));
    }

    #[test]
    fn test_validate_accepts_conforming_value() {
        let value = json!({"city": "Tokyo", "temp": 21.5, "tags": ["sunny"]});
        assert!(weather_like().validate(&value).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_required_field() {
        let err = weather_like().validate(&json!({"city": "Tokyo"})).unwrap_err();
        assert_eq!(err, "$.temp: required field is missing");
    }

    #[test]
    fn test_validate_treats_null_required_field_as_missing() {
        let err = weather_like()
            .validate(&json!({"city": "Tokyo", "temp": null}))
            .unwrap_err();
        assert!(err.contains("temp"));
    }

    #[test]
    fn test_validate_reports_nested_type_mismatch() {
        let err = weather_like()
            .validate(&json!({"city": "Tokyo", "temp": 20, "tags": ["ok", 3]}))
            .unwrap_err();
        assert_eq!(err, "$.tags[1]: expected String, got number");
    }

    #[test]
    fn test_validate_rejects_value_outside_enum() {
        let schema = Schema::object().required_property("type", Schema::one_of(["Straight"]));
        let err = schema.validate(&json!({"type": "Round"})).unwrap_err();
        assert!(err.contains("'Round' is not one of [Straight]"));
    }
}
