use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A meme specification proposed by the model: a template and its caption slots.
///
/// Parsing is deliberately lenient. Any JSON object is accepted, `template_id`
/// may be missing and slot names are not checked; the captioning service is
/// the one that decides whether the attempt is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attempt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(flatten)]
    pub fields: IndexMap<String, String>,
}

impl Attempt {
    pub fn new(template_id: impl Into<String>) -> Self {
        Attempt {
            template_id: Some(template_id.into()),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, slot: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(slot.into(), text.into());
        self
    }

    /// Parses sanitized model output.
    pub fn parse(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, String> {
        let object = match value {
            Value::Object(object) => object,
            other => return Err(format!("expected a JSON object, got {}", kind(&other))),
        };

        let mut attempt = Attempt::default();
        for (key, value) in object {
            if key == "template_id" {
                attempt.template_id = match value {
                    Value::Null => None,
                    other => scalar_text(&other).or_else(|| Some(other.to_string())),
                };
            } else {
                flatten_into(&mut attempt.fields, key, value);
            }
        }
        Ok(attempt)
    }

    /// Form fields for the captioning service, `template_id` first.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.template_id
            .iter()
            .map(|id| ("template_id".to_string(), id.clone()))
            .chain(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        if let Some(template_id) = &self.template_id {
            object.insert("template_id".to_string(), Value::String(template_id.clone()));
        }
        for (slot, text) in &self.fields {
            object.insert(slot.clone(), Value::String(text.clone()));
        }
        Value::Object(object)
    }
}

impl<'de> Deserialize<'de> for Attempt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Attempt::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Nested values use the bracket form imgflip expects, e.g. `boxes[0][text]`.
fn flatten_into(fields: &mut IndexMap<String, String>, key: String, value: Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                flatten_into(fields, format!("{key}[{index}]"), item);
            }
        }
        Value::Object(object) => {
            for (child, item) in object {
                flatten_into(fields, format!("{key}[{child}]"), item);
            }
        }
        scalar => {
            if let Some(text) = scalar_text(&scalar) {
                fields.insert(key, text);
            }
        }
    }
}
