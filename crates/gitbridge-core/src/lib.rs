//! Core traits, types, and error handling for gitbridge.
//!
//! This crate provides the foundational abstractions shared by the gateway,
//! the upstream collaborators (GitHub, LLM) and the command-line interface.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use provider::{CompletionProvider, RepositoryProvider};
pub use types::*;
