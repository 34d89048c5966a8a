//! LLM-backed repository analysis.

use std::sync::Arc;

use gitbridge_core::{
    CompletionProvider, Error, IssueFilter, RepositoryAnalysis, RepositoryProvider, Result,
};
use gitbridge_openrouter::intent::{self, PromptIntent};
use gitbridge_openrouter::prompts;
use tracing::{debug, info};

/// Number of open issues handed to the issue summary.
const ISSUE_SAMPLE_SIZE: u32 = 5;

/// Fetches a repository and its open issues and asks the LLM about both.
pub struct RepositoryAnalyzer {
    repos: Arc<dyn RepositoryProvider>,
    llm: Option<Arc<dyn CompletionProvider>>,
    model: String,
}

impl RepositoryAnalyzer {
    /// `llm` is `None` when no API key is configured; analysis then fails
    /// with `Error::NotConfigured`.
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        llm: Option<Arc<dyn CompletionProvider>>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            repos,
            llm,
            model: model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn analyze(
        &self,
        owner: &str,
        repo: &str,
        prompt: Option<&str>,
    ) -> Result<RepositoryAnalysis> {
        let full_name = format!("{}/{}", owner, repo);

        let intent = prompt.map_or(PromptIntent::Analysis, intent::classify);
        if let Some(answer) = intent.canned_response(&self.model) {
            debug!(repository = full_name.as_str(), ?intent, "Prompt answered without LLM");
            return Ok(RepositoryAnalysis {
                repository: full_name,
                repository_analysis: answer,
                issues_analysis: None,
            });
        }

        let llm = self.llm.as_ref().ok_or_else(|| {
            Error::NotConfigured("LLM API key is not set (OPENROUTER_API_KEY)".to_string())
        })?;

        info!(repository = full_name.as_str(), "Analyzing repository");

        let details = self.repos.get_repository(owner, repo).await?;
        let details = serde_json::to_value(&details)?;
        let repository_analysis = llm
            .complete(&prompts::repository_prompt(prompt), Some(&details))
            .await?;

        let filter = IssueFilter {
            state: "open".to_string(),
            per_page: ISSUE_SAMPLE_SIZE,
        };
        let issues = self.repos.list_issues(owner, repo, filter).await?;
        let issues = serde_json::to_value(&issues)?;
        let issues_analysis = llm
            .complete(prompts::ISSUES_SUMMARY_PROMPT, Some(&issues))
            .await?;

        Ok(RepositoryAnalysis {
            repository: full_name,
            repository_analysis,
            issues_analysis: Some(issues_analysis),
        })
    }
}
