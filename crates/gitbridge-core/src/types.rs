//! Domain types returned by the upstream collaborators.
//!
//! These are the shapes handed back to MCP clients (pretty-printed into tool
//! call text), so field names follow the wire format rather than Rust style
//! where they differ.

use serde::{Deserialize, Serialize};

// =============================================================================
// Repositories
// =============================================================================

/// Owner (user or organization) of a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Summary of a single repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub language: Option<String>,
    pub license: Option<String>,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub owner: RepoOwner,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
}

/// Repository search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl SearchQuery {
    /// Create a query with default sort (`stars`), order (`desc`) and page size.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sort: default_sort(),
            order: default_order(),
            per_page: default_per_page(),
        }
    }
}

/// One hit of a repository search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSearchItem {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub owner: RepoOwner,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Repository search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    pub repositories: Vec<RepoSearchItem>,
}

/// Decoded README of a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readme {
    pub name: String,
    pub path: String,
    pub html_url: Option<String>,
    pub content: String,
}

// =============================================================================
// Issues and pull requests
// =============================================================================

/// Filter for issue and pull request listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueFilter {
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            state: default_state(),
            per_page: default_per_page(),
        }
    }
}

/// Label attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub name: String,
    pub color: Option<String>,
}

/// Summary of a single issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: String,
    pub user: Option<RepoOwner>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub comments: u64,
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelSummary>,
}

/// Issue listing (pull requests excluded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueList {
    pub count: usize,
    pub issues: Vec<IssueSummary>,
}

/// Summary of a single pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: String,
    pub user: Option<RepoOwner>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub merged_at: Option<String>,
    pub draft: bool,
    pub head: String,
    pub base: String,
}

/// Pull request listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestList {
    pub count: usize,
    pub pull_requests: Vec<PullRequestSummary>,
}

/// Input for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateIssueInput {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Issue returned after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: String,
    pub created_at: Option<String>,
}

// =============================================================================
// Analysis
// =============================================================================

/// LLM analysis of a repository and its open issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryAnalysis {
    pub repository: String,
    pub repository_analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_analysis: Option<String>,
}

fn default_sort() -> String {
    "stars".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}

fn default_state() -> String {
    "open".to_string()
}

fn default_per_page() -> u32 {
    10
}
