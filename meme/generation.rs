use crate::ai::completion::CompletionModel;
use crate::ai::config::GenerationConfig;

use super::attempt::Attempt;
use super::error::{AttemptError, MemeError, MemeResult};
use super::sanitize::sanitize;

/// Asks `model` for a meme until its output parses, at most `max_attempts` times.
///
/// Failed model calls, empty replies and unparseable replies are recorded and
/// retried. The first reply that parses into an [`Attempt`] is returned as is;
/// its fields are not checked. Running out of attempts yields
/// [`MemeError::GenerationExhausted`] carrying the last recorded failure.
pub async fn generate(
    prompt: &str,
    model: &dyn CompletionModel,
    max_attempts: usize,
    config: &GenerationConfig,
) -> MemeResult<Attempt> {
    if max_attempts == 0 {
        return Err(MemeError::InvalidInput(
            "max_attempts must be at least 1".to_string(),
        ));
    }

    let mut last_error: Option<AttemptError> = None;
    for attempt in 1..=max_attempts {
        tracing::info!(
            attempt,
            max_attempts,
            model = %model.get_display_name(),
            "requesting meme completion"
        );

        let error = match model.get_completion(prompt, config).await {
            Err(err) => AttemptError::ModelCall {
                attempt,
                reason: format!("{err:#}"),
            },
            Ok(text) if text.trim().is_empty() => AttemptError::EmptyResponse { attempt },
            Ok(text) => match Attempt::parse(&sanitize(&text)) {
                Ok(parsed) => {
                    tracing::info!(attempt, "parsed meme completion");
                    return Ok(parsed);
                }
                Err(reason) => {
                    tracing::debug!(attempt, raw = %text, "unparseable completion");
                    AttemptError::MalformedOutput { attempt, reason }
                }
            },
        };

        tracing::warn!("{error}");
        last_error = Some(error);
    }

    Err(MemeError::GenerationExhausted {
        attempts: max_attempts,
        last_error: last_error.unwrap_or(AttemptError::EmptyResponse {
            attempt: max_attempts,
        }),
    })
}
