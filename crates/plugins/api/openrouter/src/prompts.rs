//! Prompt templates used by repository analysis.

/// System message sent with every completion.
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant with access to GitHub through a \
Model Context Protocol server. When analyzing GitHub repositories, focus on: stars count, forks, \
open issues, main language, and recent activity.";

/// Assistant acknowledgement inserted before tool context.
pub const CONTEXT_ACK: &str = "I've retrieved the repository information.";

/// Default prompt for repository insights.
pub const REPOSITORY_ANALYSIS_PROMPT: &str = "Please analyze this GitHub repository and provide \
key insights about:
1. Repository popularity (stars, forks)
2. Development activity (open issues, last update)
3. Technical stack (main language, topics)
4. Key metrics and statistics
Please format the response in a clear, structured way.";

/// Prompt for the open-issue summary.
pub const ISSUES_SUMMARY_PROMPT: &str = "Please summarize the key themes and patterns in these \
recent open issues. Focus on identifying common problems, feature requests, or bugs that users \
are reporting.";

/// Combine a caller-supplied focus with the default analysis prompt.
pub fn repository_prompt(user_prompt: Option<&str>) -> String {
    match user_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(focus) => format!("{}\n\nAdditional focus: {}", REPOSITORY_ANALYSIS_PROMPT, focus),
        None => REPOSITORY_ANALYSIS_PROMPT.to_string(),
    }
}
