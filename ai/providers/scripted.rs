use crate::ai::completion::CompletionModel;
use crate::ai::config::GenerationConfig;
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic model that replays a fixed script of replies.
///
/// Each call returns the next reply; once the script runs out the last reply
/// is repeated. An `Err` reply simulates a provider failure.
pub struct ScriptedModel {
    replies: Vec<Result<String, String>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::with_replies(texts.into_iter().map(|text| Ok(text.into())))
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Result<String, String>>) -> Self {
        ScriptedModel {
            replies: replies.into_iter().collect(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn get_completion(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> anyhow::Result<String> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let reply = self
            .replies
            .get(index)
            .or_else(|| self.replies.last())
            .ok_or_else(|| anyhow!("scripted model has no replies"))?;

        match reply {
            Ok(text) => anyhow::Ok(text.clone()),
            Err(message) => Err(anyhow!(message.clone())),
        }
    }

    fn get_display_name(&self) -> String {
        "Scripted/replay".to_string()
    }
}
