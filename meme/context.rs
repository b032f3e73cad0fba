use anyhow::Context as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::path::Path;

const BUNDLED_CONTEXT: &str = include_str!("default_context.json");

/// One example template shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeExample {
    #[serde(deserialize_with = "string_or_number")]
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "examples")]
    pub captions: Vec<String>,
}

impl MemeExample {
    pub fn new(template_id: impl Into<String>, captions: Vec<String>) -> Self {
        MemeExample {
            template_id: template_id.into(),
            name: None,
            captions,
        }
    }

    /// Single-line JSON rendering used inside prompts.
    pub fn render(&self) -> String {
        let mut value = json!({
            "template_id": self.template_id,
            "captions": self.captions,
        });
        if let Some(name) = &self.name {
            value["name"] = Value::String(name.clone());
        }
        value.to_string()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        // json5 may hand integers over as floats
        Value::Number(n) => Ok(match (n.as_u64(), n.as_f64()) {
            (Some(id), _) => id.to_string(),
            (None, Some(id)) if id.fract() == 0.0 && id >= 0.0 => format!("{id:.0}"),
            _ => n.to_string(),
        }),
        other => Err(serde::de::Error::custom(format!(
            "template_id must be a string or number, got {other}"
        ))),
    }
}

/// The grounding examples, in load order. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemeContext {
    examples: Vec<MemeExample>,
}

impl MemeContext {
    pub fn new(examples: Vec<MemeExample>) -> Self {
        MemeContext { examples }
    }

    /// Parses a JSON array of examples. JSON5 comments and trailing commas are accepted.
    pub fn from_json_str(contents: &str) -> anyhow::Result<Self> {
        let examples: Vec<MemeExample> = json5::from_str(contents)?;
        anyhow::Ok(MemeContext { examples })
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading meme context from {}", path.display()))?;
        let context = Self::from_json_str(&contents)
            .with_context(|| format!("parsing meme context from {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            examples = context.len(),
            "loaded meme context"
        );
        anyhow::Ok(context)
    }

    /// The example set shipped with the crate.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json_str(BUNDLED_CONTEXT)
    }

    pub fn examples(&self) -> &[MemeExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}
