use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::meme::error::{MemeError, MemeResult};

pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("system_prompt.txt");

#[derive(Eq, Serialize, PartialEq, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub provider_id: String,
    pub model_id: String,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub system_prompt: Option<String>,
    pub timeout_secs: u64,
    pub extra_args: Option<HashMap<String, Value>>,
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            provider_id: "Gemini".to_string(),
            model_id: "gemini-1.5-flash".to_string(),
            api_key: None,
            api_base: None,
            system_prompt: None,
            timeout_secs: 60,
            extra_args: None,
        }
    }
}

// Keeps api keys out of logs.
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider_id", &self.provider_id)
            .field("model_id", &self.model_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("extra_args", &self.extra_args)
            .finish()
    }
}

/// Sampling settings for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub max_attempts: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            max_output_tokens: 1000,
            temperature: 0.1,
            max_attempts: 5,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> MemeResult<()> {
        if self.max_output_tokens == 0 {
            return Err(MemeError::InvalidInput(
                "max_output_tokens must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(MemeError::InvalidInput(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.max_attempts == 0 {
            return Err(MemeError::InvalidInput(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Overlays `fields` onto a JSON object; non-objects are returned unchanged.
pub fn merge(v: &Value, fields: &HashMap<String, Value>) -> Value {
    match v {
        Value::Object(m) => {
            let mut m = m.clone();
            for (k, v) in fields {
                m.insert(k.clone(), v.clone());
            }
            Value::Object(m)
        }
        v => v.clone(),
    }
}
