//! Test doubles for the collaborator traits.

use std::sync::Mutex;

use async_trait::async_trait;
use gitbridge_core::{
    CompletionProvider, CreateIssueInput, CreatedIssue, IssueFilter, IssueList, PullRequestList,
    Readme, RepoOwner, RepoSummary, RepositoryProvider, Result, SearchQuery, SearchResults,
};
use mockall::mock;
use serde_json::Value;

mock! {
    pub Repos {}

    #[async_trait]
    impl RepositoryProvider for Repos {
        fn provider_name(&self) -> &'static str;
        async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoSummary>;
        async fn search_repositories(&self, query: SearchQuery) -> Result<SearchResults>;
        async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme>;
        async fn list_issues(
            &self,
            owner: &str,
            repo: &str,
            filter: IssueFilter,
        ) -> Result<IssueList>;
        async fn list_pull_requests(
            &self,
            owner: &str,
            repo: &str,
            filter: IssueFilter,
        ) -> Result<PullRequestList>;
        async fn create_issue(
            &self,
            owner: &str,
            repo: &str,
            input: CreateIssueInput,
        ) -> Result<CreatedIssue>;
    }
}

/// LLM double returning a fixed answer and recording every call.
pub struct FakeLlm {
    answer: String,
    calls: Mutex<Vec<(String, Option<Value>)>>,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeLlm {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn complete(&self, prompt: &str, context: Option<&Value>) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), context.cloned()));
        Ok(self.answer.clone())
    }
}

pub fn sample_repo(name: &str, stars: u64) -> RepoSummary {
    RepoSummary {
        id: 1,
        name: name.to_string(),
        full_name: format!("owner/{}", name),
        description: None,
        url: format!("https://github.com/owner/{}", name),
        stars,
        forks: 0,
        watchers: 0,
        open_issues: 0,
        language: None,
        license: None,
        default_branch: None,
        topics: vec![],
        owner: RepoOwner {
            login: "owner".to_string(),
            avatar_url: None,
            url: None,
        },
        created_at: None,
        updated_at: None,
        pushed_at: None,
    }
}
