//! Common test utilities.
//!
//! - `FixtureProvider`: repository data loaded from JSON fixtures in
//!   `tests/fixtures/github/`, so no test touches the network
//! - `FakeLlm`: completion provider with a fixed answer
//! - `gateway()`: the full router wired to both

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use gitbridge_core::{
    CompletionProvider, CreateIssueInput, CreatedIssue, Error, IssueFilter, IssueList,
    PullRequestList, Readme, RepoSummary, RepositoryProvider, Result, SearchQuery, SearchResults,
};
use gitbridge_mcp::protocol::ServerInfo;
use gitbridge_mcp::{
    router, Dispatcher, GatewayState, RepositoryAnalyzer, SessionTiming, ToolRegistry,
    UpstreamInvoker,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Repository provider backed by JSON fixtures.
///
/// Only `facebook/react` exists; every other repository is `NotFound`.
#[derive(Debug)]
pub struct FixtureProvider {
    fixtures_dir: PathBuf,
    calls: AtomicUsize,
}

impl FixtureProvider {
    /// Looks for fixtures in `tests/fixtures/{provider_name}/`
    pub fn new(provider_name: &str) -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(provider_name);

        Self {
            fixtures_dir,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of upstream calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.fixtures_dir.join(name);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to load fixture {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn lookup<T: DeserializeOwned>(&self, owner: &str, repo: &str, name: &str) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if owner != "facebook" || repo != "react" {
            return Err(Error::NotFound(format!("{}/{}", owner, repo)));
        }
        self.load(name)
    }
}

#[async_trait]
impl RepositoryProvider for FixtureProvider {
    fn provider_name(&self) -> &'static str {
        "fixtures"
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoSummary> {
        self.lookup(owner, repo, "repository.json")
    }

    async fn search_repositories(&self, query: SearchQuery) -> Result<SearchResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut results: SearchResults = self.load("search.json")?;
        results.repositories.truncate(query.per_page as usize);
        Ok(results)
    }

    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme> {
        self.lookup(owner, repo, "readme.json")
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        filter: IssueFilter,
    ) -> Result<IssueList> {
        let mut list: IssueList = self.lookup(owner, repo, "issues.json")?;
        list.issues.retain(|i| filter.state == "all" || i.state == filter.state);
        list.issues.truncate(filter.per_page as usize);
        list.count = list.issues.len();
        Ok(list)
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: IssueFilter,
    ) -> Result<PullRequestList> {
        let mut list: PullRequestList = self.lookup(owner, repo, "pull_requests.json")?;
        list.pull_requests
            .retain(|pr| filter.state == "all" || pr.state == filter.state);
        list.count = list.pull_requests.len();
        Ok(list)
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        input: CreateIssueInput,
    ) -> Result<CreatedIssue> {
        let mut created: CreatedIssue = self.lookup(owner, repo, "created_issue.json")?;
        created.title = input.title;
        Ok(created)
    }
}

/// Completion provider that always gives the same answer.
#[derive(Debug)]
pub struct FakeLlm {
    answer: String,
    calls: AtomicUsize,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FakeLlm {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn complete(&self, _prompt: &str, _context: Option<&Value>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Collaborators behind a test gateway, kept for call-count assertions.
pub struct Harness {
    pub repos: Arc<FixtureProvider>,
    pub llm: Arc<FakeLlm>,
    pub app: Router,
}

/// Gateway over fixtures with an LLM that answers `"analysis text"`.
pub fn gateway() -> Harness {
    gateway_with_timing(SessionTiming::default())
}

pub fn gateway_with_timing(timing: SessionTiming) -> Harness {
    let repos = Arc::new(FixtureProvider::new("github"));
    let llm = Arc::new(FakeLlm::answering("analysis text"));

    let analyzer = RepositoryAnalyzer::new(
        repos.clone(),
        Some(llm.clone() as Arc<dyn CompletionProvider>),
        "test-model",
    );
    let invoker = UpstreamInvoker::new(repos.clone(), analyzer);
    let dispatcher = Dispatcher::new(
        Arc::new(ToolRegistry::builtin()),
        Arc::new(invoker),
        ServerInfo::new("gitbridge", "0.1.0"),
    );

    Harness {
        repos,
        llm,
        app: router(GatewayState::new(Arc::new(dispatcher), timing)),
    }
}

/// Short timers for streaming tests.
pub fn fast_timing() -> SessionTiming {
    SessionTiming {
        catalog_delay: Duration::from_millis(20),
        keepalive_interval: Duration::from_millis(50),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_provider_loads_repository() {
        let provider = FixtureProvider::new("github");
        let repo = provider.get_repository("facebook", "react").await.unwrap();
        assert_eq!(repo.full_name, "facebook/react");
        assert_eq!(repo.stars, 1000);
    }

    #[tokio::test]
    async fn test_fixture_provider_unknown_repository() {
        let provider = FixtureProvider::new("github");
        let err = provider.get_readme("nobody", "nothing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(provider.calls(), 1);
    }
}
