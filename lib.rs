//! Prompt-to-meme generation.
//!
//! A user prompt is grounded with example meme templates, sent to a language
//! model that picks a template and captions, and the resulting [`meme::Attempt`]
//! is rendered through the imgflip captioning API. Malformed model output is
//! sanitized and retried a bounded number of times.

#[macro_use]
extern crate lazy_static;

pub mod ai;
pub mod meme;
