mod gemini;
mod scripted;

use anyhow::anyhow;

pub use gemini::{Gemini, GeminiCompletionModel};
pub use scripted::ScriptedModel;

use super::completion::{CompletionModel, CompletionProvider};
use super::config::ModelConfig;

pub const GEMINI_PROVIDER_ID: &str = "Gemini";

pub fn get_model(model_config: &ModelConfig) -> anyhow::Result<Box<dyn CompletionModel>> {
    match model_config.provider_id.as_str() {
        GEMINI_PROVIDER_ID => Gemini::load(model_config).get_model(model_config),
        other => Err(anyhow!("model provider not found: {other}")),
    }
}
