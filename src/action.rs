use std::fmt;
use std::str::FromStr;

/// One line of input at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Generate(String),
    TryAnother,
    Like,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    Empty,
    UnknownCommand(String),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Empty => write!(f, "type a meme idea, or /help"),
            ActionError::UnknownCommand(command) => {
                write!(f, "unknown command {command}, try /help")
            }
        }
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ActionError::Empty);
        }

        let Some(command) = line.strip_prefix('/') else {
            return Ok(Action::Generate(line.to_string()));
        };

        match command.to_lowercase().as_str() {
            "retry" | "r" | "another" => Ok(Action::TryAnother),
            "like" | "l" => Ok(Action::Like),
            "help" | "h" | "?" => Ok(Action::Help),
            "quit" | "q" | "exit" => Ok(Action::Quit),
            _ => Err(ActionError::UnknownCommand(line.to_string())),
        }
    }
}

pub const HELP: &str = "\
Type a meme idea and press enter to generate a meme.

  /retry   decline the current meme and try another for the same idea
  /like    tell us you liked the current meme
  /help    show this message
  /quit    leave";
