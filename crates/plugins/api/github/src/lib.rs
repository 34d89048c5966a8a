//! GitHub collaborator for gitbridge.
//!
//! This crate provides the `RepositoryProvider` backed by the GitHub REST API:
//! repository lookup, search, README, issues and pull requests.

mod client;
mod types;

pub use client::GitHubClient;
pub use types::*;

/// Default GitHub API URL.
pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";
