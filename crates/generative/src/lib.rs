//! Text completion providers
//!
//! The classifier asks a completion model to pick taxonomy entries from a
//! short list. This crate owns the provider side of that exchange: the
//! [`Completer`] trait, an OpenAI-compatible chat-completions client, and the
//! fence stripping every reply goes through before it is parsed.
//!
//! Replies are untrusted text. Nothing here interprets them beyond pulling
//! out the assistant message.

mod completer;
mod config;
mod error;
mod fence;
mod openai;

pub use crate::completer::{Completer, CompletionRequest};
pub use crate::config::{GenerativeConfig, OPENAI_CHAT_COMPLETIONS_URL};
pub use crate::error::GenerativeError;
pub use crate::fence::strip_code_fence;
pub use crate::openai::OpenAiCompleter;
