//! Collaborator traits consumed by the gateway.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{
    CreateIssueInput, CreatedIssue, IssueFilter, IssueList, PullRequestList, Readme, RepoSummary,
    SearchQuery, SearchResults,
};

/// Source of repository data (GitHub, or a stub in tests).
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Get the provider name (e.g., "github")
    fn provider_name(&self) -> &'static str;

    /// Get a single repository
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoSummary>;

    /// Search repositories
    async fn search_repositories(&self, query: SearchQuery) -> Result<SearchResults>;

    /// Get the decoded README of a repository
    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme>;

    /// List issues of a repository (pull requests excluded)
    async fn list_issues(&self, owner: &str, repo: &str, filter: IssueFilter)
        -> Result<IssueList>;

    /// List pull requests of a repository
    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: IssueFilter,
    ) -> Result<PullRequestList>;

    /// Create an issue
    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        input: CreateIssueInput,
    ) -> Result<CreatedIssue>;
}

/// LLM text completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name (e.g., "openrouter")
    fn provider_name(&self) -> &'static str;

    /// Complete `prompt`, optionally grounding the answer in `context`.
    async fn complete(&self, prompt: &str, context: Option<&Value>) -> Result<String>;
}
