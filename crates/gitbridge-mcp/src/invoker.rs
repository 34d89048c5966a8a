//! Upstream invoker.
//!
//! Maps a validated tool call onto the collaborator that serves it. Failures
//! never reach the wire as JSON-RPC errors; they come back as a failed
//! [`ToolOutcome`] carrying the error text.

use std::sync::Arc;

use gitbridge_core::{
    CreateIssueInput, Error, IssueFilter, RepositoryProvider, Result, SearchQuery,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::RepositoryAnalyzer;

/// What a tool produced, before canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure(String),
}

impl ToolOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }
}

/// Render a tool value as text: strings verbatim, anything else pretty-printed.
pub fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Executes tools against the GitHub and LLM collaborators.
pub struct UpstreamInvoker {
    repos: Arc<dyn RepositoryProvider>,
    analyzer: RepositoryAnalyzer,
}

impl UpstreamInvoker {
    pub fn new(repos: Arc<dyn RepositoryProvider>, analyzer: RepositoryAnalyzer) -> Self {
        Self { repos, analyzer }
    }

    pub fn analyzer(&self) -> &RepositoryAnalyzer {
        &self.analyzer
    }

    /// Execute a tool by name with arguments.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> ToolOutcome {
        match self.call(name, arguments).await {
            Ok(value) => {
                tracing::debug!(tool = name, "Tool call succeeded");
                ToolOutcome::Success(value)
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                ToolOutcome::Failure(format!("Error executing tool {}: {}", name, e))
            }
        }
    }

    async fn call(&self, name: &str, arguments: &Value) -> Result<Value> {
        match name {
            "get_repository" => {
                let params: RepoParams = parse_args(arguments)?;
                to_value(self.repos.get_repository(&params.owner, &params.repo).await?)
            }
            "search_repositories" => {
                let params: SearchParams = parse_args(arguments)?;
                let mut query = SearchQuery::new(params.query);
                if let Some(sort) = params.sort {
                    query.sort = sort;
                }
                if let Some(order) = params.order {
                    query.order = order;
                }
                if let Some(per_page) = params.per_page {
                    query.per_page = per_page;
                }
                to_value(self.repos.search_repositories(query).await?)
            }
            "get_readme" => {
                let params: RepoParams = parse_args(arguments)?;
                to_value(self.repos.get_readme(&params.owner, &params.repo).await?)
            }
            "list_issues" => {
                let params: ListParams = parse_args(arguments)?;
                let filter = params.filter();
                to_value(
                    self.repos
                        .list_issues(&params.owner, &params.repo, filter)
                        .await?,
                )
            }
            "list_pull_requests" => {
                let params: ListParams = parse_args(arguments)?;
                let filter = params.filter();
                to_value(
                    self.repos
                        .list_pull_requests(&params.owner, &params.repo, filter)
                        .await?,
                )
            }
            "create_issue" => {
                let params: CreateIssueParams = parse_args(arguments)?;
                let input = CreateIssueInput {
                    title: params.title,
                    body: params.body,
                    labels: params.labels.unwrap_or_default(),
                };
                to_value(
                    self.repos
                        .create_issue(&params.owner, &params.repo, input)
                        .await?,
                )
            }
            "analyze_repository" => {
                let params: AnalyzeParams = parse_args(arguments)?;
                to_value(
                    self.analyzer
                        .analyze(&params.owner, &params.repo, params.prompt.as_deref())
                        .await?,
                )
            }
            _ => Err(Error::InvalidData(format!("Unknown tool: {}", name))),
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: &Value) -> Result<T> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| Error::InvalidData(format!("invalid arguments: {}", e)))
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Parameters for tools addressing a single repository.
#[derive(Debug, Deserialize)]
struct RepoParams {
    owner: String,
    repo: String,
}

/// Parameters for search_repositories tool.
#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    sort: Option<String>,
    order: Option<String>,
    per_page: Option<u32>,
}

/// Parameters for list_issues and list_pull_requests tools.
#[derive(Debug, Deserialize)]
struct ListParams {
    owner: String,
    repo: String,
    state: Option<String>,
    per_page: Option<u32>,
}

impl ListParams {
    fn filter(&self) -> IssueFilter {
        let defaults = IssueFilter::default();
        IssueFilter {
            state: self.state.clone().unwrap_or(defaults.state),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Parameters for create_issue tool.
#[derive(Debug, Deserialize)]
struct CreateIssueParams {
    owner: String,
    repo: String,
    title: String,
    body: Option<String>,
    labels: Option<Vec<String>>,
}

/// Parameters for analyze_repository tool.
#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    owner: String,
    repo: String,
    prompt: Option<String>,
}
