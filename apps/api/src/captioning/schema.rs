//! Caption schema: the declarative, per-meme shape of a caption, and the
//! structured output parser that checks LLM responses against it.
//!
//! A meme's schema string ("Top Caption / Bottom Caption",
//! "Not Sure If [caption] / Or [caption]") is turned into an ordered list of
//! named string fields. Responses must be a JSON object with exactly those
//! fields; anything else is a `ParseError`, never coerced.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm_client::strip_json_fences;

/// Field name used when a meme has no usable schema string.
pub const FALLBACK_FIELD: &str = "caption";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response must be a JSON object")]
    NotAnObject,

    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Field '{0}' must be a non-empty string")]
    NotAString(String),

    #[error("Unexpected field '{0}'")]
    UnknownField(String),
}

/// One named text slot of a caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    /// Length the model is asked to stay under. Advertised as `maxLength`,
    /// not enforced when parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<usize>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            max_chars: None,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSchema {
    fields: Vec<FieldSpec>,
}

impl CaptionSchema {
    /// Builds a schema from explicit fields. An empty list falls back to a
    /// single free-form `caption` field.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        if fields.is_empty() {
            return Self::single_caption();
        }
        Self { fields }
    }

    fn single_caption() -> Self {
        Self {
            fields: vec![FieldSpec::new(FALLBACK_FIELD, "The full meme caption")],
        }
    }

    /// Derives the field list from a catalog schema string.
    ///
    /// Each `/`-separated segment contributes its `[placeholder]` names, or,
    /// when it has none, one field named after the segment itself.
    pub fn from_layout(layout: &str) -> Self {
        let mut fields: Vec<FieldSpec> = Vec::new();

        for segment in layout.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            let placeholders = placeholders(segment);
            let names = if placeholders.is_empty() {
                vec![snake_case(segment)]
            } else {
                placeholders.iter().map(|p| snake_case(p)).collect()
            };

            for name in names.into_iter().filter(|n| !n.is_empty()) {
                let name = dedupe(&fields, name);
                fields.push(FieldSpec::new(name, format!("Text for the \"{segment}\" part")));
            }
        }

        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// JSON-Schema-shaped description of the expected response object.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                let mut prop = json!({ "type": "string", "description": f.description });
                if let Some(max) = f.max_chars {
                    prop["maxLength"] = json!(max);
                }
                (f.name.clone(), prop)
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.field_names(),
            "additionalProperties": false,
        })
    }

    /// Machine-readable instructions embedded in every prompt.
    pub fn format_instructions(&self) -> String {
        let schema = serde_json::to_string_pretty(&self.json_schema()).unwrap_or_default();
        format!(
            "The output must be a JSON object that conforms to the JSON schema below.\n\
             Every property is required, every value is a string, and no other \
             properties are allowed.\n\n{schema}"
        )
    }

    /// Structured output parser: raw LLM text → validated candidate.
    pub fn parse(&self, raw: &str) -> Result<CaptionCandidate, ParseError> {
        let value: Value = serde_json::from_str(strip_json_fences(raw))
            .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        self.validate(value)
    }

    /// Validates an already-decoded value. Field order follows the schema.
    pub fn validate(&self, value: Value) -> Result<CaptionCandidate, ParseError> {
        let Value::Object(mut object) = value else {
            return Err(ParseError::NotAnObject);
        };

        let mut fields = Map::new();
        for field in &self.fields {
            let value = object
                .remove(&field.name)
                .ok_or_else(|| ParseError::MissingField(field.name.clone()))?;
            match value {
                Value::String(text) if !text.trim().is_empty() => {
                    fields.insert(field.name.clone(), Value::String(text));
                }
                _ => return Err(ParseError::NotAString(field.name.clone())),
            }
        }

        if let Some(extra) = object.keys().next() {
            return Err(ParseError::UnknownField(extra.clone()));
        }

        Ok(CaptionCandidate { fields })
    }
}

/// A caption that has passed schema validation. Only `CaptionSchema` can
/// construct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CaptionCandidate {
    fields: Map<String, Value>,
}

impl CaptionCandidate {
    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.as_str(), s)))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Single-line rendering, fields joined in schema order.
    pub fn to_line(&self) -> String {
        self.fields().map(|(_, text)| text).collect::<Vec<_>>().join(" / ")
    }
}

fn placeholders(segment: &str) -> Vec<&str> {
    segment
        .split('[')
        .skip(1)
        .filter_map(|rest| rest.split_once(']').map(|(name, _)| name.trim()))
        .filter(|name| !name.is_empty())
        .collect()
}

fn snake_case(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

fn dedupe(existing: &[FieldSpec], name: String) -> String {
    let taken = |candidate: &str| existing.iter().any(|f| f.name == candidate);
    if !taken(&name) {
        return name;
    }
    (2..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(name)
}
