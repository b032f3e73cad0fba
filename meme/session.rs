use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attempt::Attempt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMeme {
    pub attempt: Attempt,
    pub image_url: String,
}

/// One user's run of generate / try another / like actions.
///
/// Owned by the caller and handed to the pipeline by `&mut`, so nothing a
/// request does can leak into another user's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    previous_attempts: Vec<Attempt>,
    current: Option<CurrentMeme>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            id: Uuid::new_v4(),
            previous_attempts: Vec::new(),
            current: None,
        }
    }

    /// Attempts the model should not propose again, oldest first.
    pub fn previous_attempts(&self) -> &[Attempt] {
        &self.previous_attempts
    }

    pub fn current(&self) -> Option<&CurrentMeme> {
        self.current.as_ref()
    }

    pub fn current_meme_url(&self) -> Option<&str> {
        self.current.as_ref().map(|current| current.image_url.as_str())
    }

    pub(crate) fn reject(&mut self, attempt: Attempt) {
        self.previous_attempts.push(attempt);
    }

    pub(crate) fn set_current(&mut self, attempt: Attempt, image_url: String) {
        self.current = Some(CurrentMeme { attempt, image_url });
    }

    /// Moves the meme on display into the declined list.
    pub(crate) fn decline_current(&mut self) {
        if let Some(current) = self.current.take() {
            self.previous_attempts.push(current.attempt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sessions_get_distinct_ids() {
        assert_ne!(Session::new().id, Session::new().id);
    }

    #[test]
    fn declining_moves_current_into_history() {
        let mut session = Session::new();
        session.decline_current();
        assert!(session.previous_attempts().is_empty());

        let attempt = Attempt::new("1").with_field("text0", "hi");
        session.set_current(attempt.clone(), "http://x/1.jpg".to_string());
        assert_eq!(session.current_meme_url(), Some("http://x/1.jpg"));

        session.decline_current();
        assert_eq!(session.previous_attempts(), &[attempt]);
        assert_eq!(session.current(), None);
    }
}
