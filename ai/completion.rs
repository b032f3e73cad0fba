use async_trait::async_trait;

use super::config::{GenerationConfig, ModelConfig};

pub type CompletionModelID = String;
pub type CompletionProviderID = String;

/// A text-in, text-out language model.
///
/// An empty string is a valid completion; deciding what to do with it is left
/// to the caller.
#[async_trait]
pub trait CompletionModel: Sync + Send {
    async fn get_completion(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> anyhow::Result<String>;

    fn get_display_name(&self) -> String;
}

pub trait CompletionProvider: Sync {
    fn load(model_config: &ModelConfig) -> Self
    where
        Self: Sized;
    fn has_credentials(&self) -> bool;
    fn get_model(&self, model_config: &ModelConfig) -> anyhow::Result<Box<dyn CompletionModel>>;

    fn get_id(&self) -> CompletionProviderID;
}
