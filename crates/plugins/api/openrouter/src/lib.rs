//! OpenRouter collaborator for gitbridge.
//!
//! Provides the `CompletionProvider` backed by the OpenRouter chat-completions
//! API, the prompt templates used by repository analysis, and keyword-based
//! prompt intent heuristics.

mod client;
pub mod intent;
pub mod prompts;
mod types;

pub use client::OpenRouterClient;
pub use intent::PromptIntent;
pub use types::*;

/// Default OpenRouter API URL.
pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "google/gemma-3-12b-it:free";
