use rand::seq::SliceRandom;
use rand::Rng;

use super::attempt::Attempt;
use super::context::{MemeContext, MemeExample};
use super::error::{MemeError, MemeResult};

pub const DECLINED_HEADER: &str =
    "DECLINED MEMES (MAKE SOMETHING ELSE USING USER INPUT AND CONTEXT)";
pub const USER_INPUT_HEADER: &str = "USER INPUT:";
pub const CONTEXT_HEADER: &str = "AVAILABLE CONTEXT:";
pub const SEPARATOR: &str = "====";

/// Builds the model prompt with a freshly shuffled context.
pub fn build_prompt(
    user_input: &str,
    context: &MemeContext,
    previous_attempts: &[Attempt],
) -> MemeResult<String> {
    build_prompt_with_rng(user_input, context, previous_attempts, &mut rand::thread_rng())
}

/// Builds the model prompt, drawing the context order from `rng`.
///
/// Layout, joined with newlines:
///
/// ```text
/// DECLINED MEMES (...)        <- only when there are previous attempts
/// ====
/// {attempt}
///
/// USER INPUT:
/// {trimmed user input}
/// ====
/// AVAILABLE CONTEXT:
/// {one example per line}
/// ```
pub fn build_prompt_with_rng<R: Rng + ?Sized>(
    user_input: &str,
    context: &MemeContext,
    previous_attempts: &[Attempt],
    rng: &mut R,
) -> MemeResult<String> {
    let user_input = user_input.trim();
    if user_input.is_empty() {
        return Err(MemeError::InvalidInput(
            "user_input must be a non-empty string".to_string(),
        ));
    }
    if context.is_empty() {
        return Err(MemeError::InvalidInput(
            "meme context must contain at least one example".to_string(),
        ));
    }

    let mut prompt_parts = Vec::<String>::new();

    if !previous_attempts.is_empty() {
        tracing::debug!(
            previous_attempts = previous_attempts.len(),
            "including declined memes"
        );
        let mut declined_memes = format!("{DECLINED_HEADER}\n{SEPARATOR}");
        for attempt in previous_attempts {
            declined_memes.push_str(format!("\n{attempt}\n").as_str());
        }
        prompt_parts.push(declined_memes);
    }

    let mut examples = context.examples().iter().collect::<Vec<&MemeExample>>();
    examples.shuffle(rng);
    let rendered_context = examples
        .iter()
        .map(|example| example.render())
        .collect::<Vec<String>>()
        .join("\n");

    prompt_parts.push(format!("{USER_INPUT_HEADER}\n{user_input}"));
    prompt_parts.push(SEPARATOR.to_string());
    prompt_parts.push(format!("{CONTEXT_HEADER}\n{rendered_context}"));

    Ok(prompt_parts.join("\n"))
}
