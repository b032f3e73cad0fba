pub mod attempt;
pub mod context;
pub mod error;
pub mod events;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod sanitize;
pub mod session;

pub use attempt::Attempt;
pub use context::{MemeContext, MemeExample};
pub use error::{AttemptError, MemeError, MemeResult};
pub use events::{
    Event, EventLogger, EventStore, EventType, JsonlEventStore, MemoryEventStore, SqliteEventStore,
};
pub use generation::generate;
pub use pipeline::{Meme, MemeGenerator};
pub use prompt::{build_prompt, build_prompt_with_rng};
pub use render::{Credentials, RenderClient, RenderConfig, RenderResult};
pub use sanitize::sanitize;
pub use session::Session;
