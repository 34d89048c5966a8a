//! GitHub API client implementation.

use async_trait::async_trait;
use base64::Engine;
use gitbridge_core::{
    CreateIssueInput, CreatedIssue, Error, IssueFilter, IssueList, IssueSummary, LabelSummary,
    PullRequestList, PullRequestSummary, Readme, RepoOwner, RepoSearchItem, RepoSummary,
    RepositoryProvider, Result, SearchQuery, SearchResults,
};
use tracing::{debug, warn};

use crate::types::{
    CreateIssueRequest, GitHubContent, GitHubIssue, GitHubPullRequest, GitHubRepository,
    GitHubSearchResponse, GitHubUser,
};
use crate::DEFAULT_GITHUB_URL;

/// GitHub API client.
///
/// The token is optional: unauthenticated requests work against public
/// repositories with GitHub's lower rate limit.
pub struct GitHubClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a new GitHub client.
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_GITHUB_URL, token)
    }

    /// Create a new GitHub client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    /// Whether requests carry a bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Build request with common headers.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "gitbridge")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Get the repository API URL for a given endpoint.
    fn repo_url(&self, owner: &str, repo: &str, endpoint: &str) -> String {
        format!("{}/repos/{}/{}{}", self.base_url, owner, repo, endpoint)
    }

    /// Make a GET request with typed deserialization.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(url = url, "GitHub GET request");

        let response = self
            .request(reqwest::Method::GET, url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Make a POST request.
    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(url = url, "GitHub POST request");

        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            warn!(
                status = status_code,
                message = message.as_str(),
                "GitHub API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }
}

/// Extract GitHub's `message` field from an error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

// =============================================================================
// Mapping functions: GitHub types -> domain types
// =============================================================================

fn map_owner(user: &GitHubUser) -> RepoOwner {
    RepoOwner {
        login: user.login.clone(),
        avatar_url: user.avatar_url.clone(),
        url: user.html_url.clone(),
    }
}

fn map_repository(gh: &GitHubRepository) -> RepoSummary {
    RepoSummary {
        id: gh.id,
        name: gh.name.clone(),
        full_name: gh.full_name.clone(),
        description: gh.description.clone(),
        url: gh.html_url.clone(),
        stars: gh.stargazers_count,
        forks: gh.forks_count,
        watchers: gh.watchers_count,
        open_issues: gh.open_issues_count,
        language: gh.language.clone(),
        license: gh.license.as_ref().map(|l| l.name.clone()),
        default_branch: gh.default_branch.clone(),
        topics: gh.topics.clone(),
        owner: map_owner(&gh.owner),
        created_at: gh.created_at.clone(),
        updated_at: gh.updated_at.clone(),
        pushed_at: gh.pushed_at.clone(),
    }
}

fn map_search_item(gh: &GitHubRepository) -> RepoSearchItem {
    RepoSearchItem {
        id: gh.id,
        name: gh.name.clone(),
        full_name: gh.full_name.clone(),
        description: gh.description.clone(),
        url: gh.html_url.clone(),
        stars: gh.stargazers_count,
        forks: gh.forks_count,
        language: gh.language.clone(),
        owner: map_owner(&gh.owner),
        created_at: gh.created_at.clone(),
        updated_at: gh.updated_at.clone(),
    }
}

fn map_issue(gh: &GitHubIssue) -> IssueSummary {
    IssueSummary {
        number: gh.number,
        title: gh.title.clone(),
        state: gh.state.clone(),
        url: gh.html_url.clone(),
        user: gh.user.as_ref().map(map_owner),
        created_at: gh.created_at.clone(),
        updated_at: gh.updated_at.clone(),
        comments: gh.comments,
        body: gh.body.clone(),
        labels: gh
            .labels
            .iter()
            .map(|l| LabelSummary {
                name: l.name.clone(),
                color: l.color.clone(),
            })
            .collect(),
    }
}

fn map_pull_request(gh: &GitHubPullRequest) -> PullRequestSummary {
    PullRequestSummary {
        number: gh.number,
        title: gh.title.clone(),
        state: gh.state.clone(),
        url: gh.html_url.clone(),
        user: gh.user.as_ref().map(map_owner),
        created_at: gh.created_at.clone(),
        updated_at: gh.updated_at.clone(),
        merged_at: gh.merged_at.clone(),
        draft: gh.draft,
        head: gh.head.ref_name.clone(),
        base: gh.base.ref_name.clone(),
    }
}

fn map_readme(gh: GitHubContent) -> Result<Readme> {
    let content = match gh.encoding.as_deref() {
        Some("base64") => decode_base64(&gh.content)?,
        _ => gh.content,
    };

    Ok(Readme {
        name: gh.name,
        path: gh.path,
        html_url: gh.html_url,
        content,
    })
}

/// Decode GitHub's line-wrapped base64 file content.
fn decode_base64(encoded: &str) -> Result<String> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| Error::InvalidData(format!("Invalid base64 content: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl RepositoryProvider for GitHubClient {
    fn provider_name(&self) -> &'static str {
        "github"
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoSummary> {
        let url = self.repo_url(owner, repo, "");
        let gh: GitHubRepository = self.get(&url, &[]).await?;
        Ok(map_repository(&gh))
    }

    async fn search_repositories(&self, query: SearchQuery) -> Result<SearchResults> {
        let url = format!("{}/search/repositories", self.base_url);
        let params = [
            ("q", query.query),
            ("sort", query.sort),
            ("order", query.order),
            ("per_page", query.per_page.to_string()),
        ];

        let response: GitHubSearchResponse = self.get(&url, &params).await?;
        Ok(SearchResults {
            total_count: response.total_count,
            repositories: response.items.iter().map(map_search_item).collect(),
        })
    }

    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme> {
        let url = self.repo_url(owner, repo, "/readme");
        let content: GitHubContent = self.get(&url, &[]).await?;
        map_readme(content)
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        filter: IssueFilter,
    ) -> Result<IssueList> {
        let url = self.repo_url(owner, repo, "/issues");
        let params = [
            ("state", filter.state),
            ("per_page", filter.per_page.to_string()),
        ];

        let gh_issues: Vec<GitHubIssue> = self.get(&url, &params).await?;
        let issues: Vec<IssueSummary> = gh_issues
            .iter()
            .filter(|i| i.pull_request.is_none())
            .map(map_issue)
            .collect();

        Ok(IssueList {
            count: issues.len(),
            issues,
        })
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        filter: IssueFilter,
    ) -> Result<PullRequestList> {
        let url = self.repo_url(owner, repo, "/pulls");
        let params = [
            ("state", filter.state),
            ("per_page", filter.per_page.to_string()),
        ];

        let gh_prs: Vec<GitHubPullRequest> = self.get(&url, &params).await?;
        Ok(PullRequestList {
            count: gh_prs.len(),
            pull_requests: gh_prs.iter().map(map_pull_request).collect(),
        })
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        input: CreateIssueInput,
    ) -> Result<CreatedIssue> {
        if self.token.is_none() {
            return Err(Error::Auth(
                "creating issues requires a GitHub token".to_string(),
            ));
        }

        let url = self.repo_url(owner, repo, "/issues");
        let request = CreateIssueRequest {
            title: input.title,
            body: input.body,
            labels: input.labels,
        };

        let gh: GitHubIssue = self.post(&url, &request).await?;
        Ok(CreatedIssue {
            number: gh.number,
            title: gh.title,
            state: gh.state,
            url: gh.html_url,
            created_at: gh.created_at,
        })
    }
}
