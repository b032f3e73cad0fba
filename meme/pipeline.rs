use chrono::Local;
use serde_json::json;

use crate::ai::completion::CompletionModel;
use crate::ai::config::GenerationConfig;

use super::attempt::Attempt;
use super::context::MemeContext;
use super::error::{MemeError, MemeResult};
use super::events::{EventLogger, EventType};
use super::generation::generate;
use super::prompt::build_prompt;
use super::render::{Credentials, RenderClient, RenderResult};
use super::session::Session;

pub const LIKE_RESPONSE: &str = "Thanks for the feedback! Try another one or generate a new meme.";

/// A rendered meme.
#[derive(Debug, Clone, PartialEq)]
pub struct Meme {
    pub image_url: String,
    pub attempt: Attempt,
    pub render: RenderResult,
}

/// Runs prompt → model → render → event log for one session at a time.
///
/// Shared between sessions; all per-user state lives in the [`Session`]
/// passed to each call.
pub struct MemeGenerator {
    context: MemeContext,
    model: Box<dyn CompletionModel>,
    renderer: RenderClient,
    credentials: Credentials,
    generation: GenerationConfig,
    events: EventLogger,
}

impl MemeGenerator {
    pub fn new(
        context: MemeContext,
        model: Box<dyn CompletionModel>,
        renderer: RenderClient,
        credentials: Credentials,
        generation: GenerationConfig,
        events: EventLogger,
    ) -> MemeResult<Self> {
        generation.validate()?;
        if context.is_empty() {
            return Err(MemeError::InvalidInput(
                "meme context must contain at least one example".to_string(),
            ));
        }

        Ok(MemeGenerator {
            context,
            model,
            renderer,
            credentials,
            generation,
            events,
        })
    }

    pub fn model_name(&self) -> String {
        self.model.get_display_name()
    }

    pub async fn log_startup(&self, session: &Session) -> Option<String> {
        self.events
            .log_event(
                session.id,
                EventType::Startup,
                json!({"status": "initializing", "model": self.model_name()}),
                None,
            )
            .await
    }

    /// Generates and renders a meme for `prompt`, steering away from the
    /// session's declined attempts.
    ///
    /// A meme the captioning service refuses is added to the declined list
    /// and reported as [`MemeError::RenderRejected`]. Every outcome is logged
    /// as an event; a failed event write does not change the result.
    pub async fn generate_meme(&self, session: &mut Session, prompt: &str) -> MemeResult<Meme> {
        match self.create_meme(session, prompt).await {
            Ok(meme) => {
                self.events
                    .log_event(
                        session.id,
                        EventType::MemeCreated,
                        json!({
                            "prompt": prompt,
                            "image_url": meme.image_url,
                            "template_id": meme.attempt.template_id,
                        }),
                        Some(json!({"client_timestamp": Local::now().to_rfc3339()})),
                    )
                    .await;
                Ok(meme)
            }
            Err(err) => {
                tracing::error!(session_id = %session.id, "meme generation failed: {err}");
                self.events
                    .log_event(
                        session.id,
                        EventType::Error,
                        json!({
                            "error_type": err.kind(),
                            "error_message": err.to_string(),
                            "prompt": prompt,
                        }),
                        None,
                    )
                    .await;
                Err(err)
            }
        }
    }

    /// Declines the meme currently on display, then generates a new one.
    pub async fn try_another(&self, session: &mut Session, prompt: &str) -> MemeResult<Meme> {
        session.decline_current();
        self.generate_meme(session, prompt).await
    }

    /// Records that the user liked the meme on display. `None` when there is none.
    pub async fn like_meme(&self, session: &Session) -> Option<&'static str> {
        let image_url = session.current_meme_url()?;
        self.events
            .log_event(
                session.id,
                EventType::MemeLiked,
                json!({"image_url": image_url}),
                Some(json!({"client_timestamp": Local::now().to_rfc3339()})),
            )
            .await;
        Some(LIKE_RESPONSE)
    }

    async fn create_meme(&self, session: &mut Session, prompt: &str) -> MemeResult<Meme> {
        let full_prompt = build_prompt(prompt, &self.context, session.previous_attempts())?;

        let attempt = generate(
            &full_prompt,
            self.model.as_ref(),
            self.generation.max_attempts,
            &self.generation,
        )
        .await?;

        let render = self.renderer.render(&attempt, &self.credentials).await?;

        match (render.success, render.image_url.clone()) {
            (true, Some(image_url)) => {
                session.set_current(attempt.clone(), image_url.clone());
                Ok(Meme {
                    image_url,
                    attempt,
                    render,
                })
            }
            _ => {
                let error_message = render
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string());
                session.reject(attempt);
                Err(MemeError::RenderRejected(error_message))
            }
        }
    }
}
