use thiserror::Error;

/// Why a single generation attempt was discarded. Always retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("attempt {attempt} failed: model call failed: {reason}")]
    ModelCall { attempt: usize, reason: String },
    #[error("attempt {attempt} failed: model returned empty response")]
    EmptyResponse { attempt: usize },
    #[error("attempt {attempt} failed: malformed output: {reason}")]
    MalformedOutput { attempt: usize, reason: String },
}

impl AttemptError {
    pub fn attempt(&self) -> usize {
        match self {
            AttemptError::ModelCall { attempt, .. }
            | AttemptError::EmptyResponse { attempt }
            | AttemptError::MalformedOutput { attempt, .. } => *attempt,
        }
    }
}

#[derive(Debug, Error)]
pub enum MemeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed after {attempts} attempts, last error: {last_error}")]
    GenerationExhausted {
        attempts: usize,
        last_error: AttemptError,
    },
    #[error("captioning request failed: {0}")]
    RenderTransport(String),
    #[error("meme creation failed: {0}")]
    RenderRejected(String),
}

impl MemeError {
    /// Stable name used for the `error_type` of logged error events.
    pub fn kind(&self) -> &'static str {
        match self {
            MemeError::InvalidInput(_) => "InvalidInput",
            MemeError::GenerationExhausted { .. } => "GenerationExhausted",
            MemeError::RenderTransport(_) => "RenderTransportError",
            MemeError::RenderRejected(_) => "RenderRejected",
        }
    }
}

pub type MemeResult<T> = Result<T, MemeError>;
