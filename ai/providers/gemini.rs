use crate::ai::completion::{
    CompletionModel, CompletionModelID, CompletionProvider, CompletionProviderID,
};
use crate::ai::config::{merge, GenerationConfig, ModelConfig};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Default)]
pub struct Gemini {
    api_key: Option<String>,
}

impl CompletionProvider for Gemini {
    fn load(model_config: &ModelConfig) -> Self {
        Gemini {
            api_key: model_config
                .api_key
                .clone()
                .filter(|api_key| !api_key.trim().is_empty()),
        }
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn get_model(&self, model_config: &ModelConfig) -> anyhow::Result<Box<dyn CompletionModel>> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("no api key configured for {}", self.get_id()))?;

        let client = reqwest::Client::builder()
            .timeout(model_config.timeout())
            .build()?;

        anyhow::Ok(Box::new(GeminiCompletionModel {
            client,
            api_base: model_config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model_id: model_config.model_id.clone(),
            api_key,
            system_instruction: model_config.system_prompt().to_string(),
            extra_args: model_config.extra_args.clone(),
        }))
    }

    fn get_id(&self) -> CompletionProviderID {
        super::GEMINI_PROVIDER_ID.to_string()
    }
}

pub struct GeminiCompletionModel {
    client: reqwest::Client,
    api_base: String,
    model_id: CompletionModelID,
    api_key: String,
    system_instruction: String,
    extra_args: Option<HashMap<String, Value>>,
}

impl GeminiCompletionModel {
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model_id
        )
    }

    fn get_inputs(&self, prompt: &str, config: &GenerationConfig) -> Value {
        let mut generation_config = json!({
            "maxOutputTokens": config.max_output_tokens,
            "temperature": config.temperature,
        });
        if let Some(extra_args) = &self.extra_args {
            generation_config = merge(&generation_config, extra_args);
        }

        let mut inputs = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": generation_config,
        });
        if !self.system_instruction.trim().is_empty() {
            inputs["system_instruction"] = json!({"parts": [{"text": self.system_instruction}]});
        }

        inputs
    }
}

#[async_trait]
impl CompletionModel for GeminiCompletionModel {
    async fn get_completion(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> anyhow::Result<String> {
        let inputs = self.get_inputs(prompt, config);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&inputs)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} returned {status}: {body}", self.get_display_name()));
        }

        let body: GenerateContentResponse = response.json().await?;
        tracing::debug!(
            model = %self.get_display_name(),
            candidates = body.candidates.len(),
            "received completion"
        );

        anyhow::Ok(body.text())
    }

    fn get_display_name(&self) -> String {
        format!("{}/{}", super::GEMINI_PROVIDER_ID, self.model_id)
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate; blocked or empty candidates yield "".
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
