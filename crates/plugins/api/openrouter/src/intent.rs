//! Keyword heuristics for classifying free-form analysis prompts.
//!
//! These are best-effort content filters. They match lowercase substrings and
//! will miss paraphrases; nothing downstream relies on them for safety.

/// What a user prompt appears to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptIntent {
    /// Asks which AI model or assistant is answering.
    ModelIdentity,
    /// Asks for something the gateway refuses to help with.
    Harmful,
    /// Asks how to connect an assistant or IDE to the gateway.
    Integration,
    /// Anything else: a regular repository analysis request.
    Analysis,
}

const MODEL_IDENTITY_PATTERNS: &[&str] = &[
    "which model",
    "what model",
    "which llm",
    "what llm",
    "who are you",
    "what are you",
    "are you gpt",
    "are you claude",
    "are you gemini",
    "your model",
];

const HARMFUL_PATTERNS: &[&str] = &[
    "malware",
    "exploit",
    "ransomware",
    "keylogger",
    "steal credentials",
    "steal password",
    "phishing",
    "ddos",
    "backdoor",
];

const INTEGRATION_PATTERNS: &[&str] = &[
    "integrate",
    "integration",
    "connect to",
    "set up mcp",
    "setup mcp",
    "configure mcp",
    "ide plugin",
    "mcp server",
];

fn matches_any(prompt: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| prompt.contains(p))
}

/// Whether the prompt asks about the answering model.
pub fn is_model_identity_question(prompt: &str) -> bool {
    matches_any(&prompt.to_lowercase(), MODEL_IDENTITY_PATTERNS)
}

/// Whether the prompt looks like a harmful request.
pub fn is_harmful_request(prompt: &str) -> bool {
    matches_any(&prompt.to_lowercase(), HARMFUL_PATTERNS)
}

/// Whether the prompt asks how to integrate with the gateway.
pub fn is_integration_question(prompt: &str) -> bool {
    matches_any(&prompt.to_lowercase(), INTEGRATION_PATTERNS)
}

/// Classify a prompt. Harmful wins over everything else.
pub fn classify(prompt: &str) -> PromptIntent {
    if is_harmful_request(prompt) {
        PromptIntent::Harmful
    } else if is_model_identity_question(prompt) {
        PromptIntent::ModelIdentity
    } else if is_integration_question(prompt) {
        PromptIntent::Integration
    } else {
        PromptIntent::Analysis
    }
}

impl PromptIntent {
    /// Fixed answer for intents that skip the LLM, `None` for analysis.
    pub fn canned_response(self, model: &str) -> Option<String> {
        match self {
            PromptIntent::ModelIdentity => Some(format!(
                "Repository analysis is generated by the `{}` model via OpenRouter.",
                model
            )),
            PromptIntent::Harmful => Some(
                "This request can't be handled. Ask about the repository's code, activity or issues instead."
                    .to_string(),
            ),
            PromptIntent::Integration => Some(
                "Point your assistant at the `/mcp` endpoint: POST JSON-RPC 2.0 requests \
                 (`initialize`, `tools/list`, `tools/call`) or open it with \
                 `Accept: text/event-stream` for the streaming handshake."
                    .to_string(),
            ),
            PromptIntent::Analysis => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_analysis_by_default() {
        assert_eq!(
            classify("Focus on release cadence and test coverage"),
            PromptIntent::Analysis
        );
        assert_eq!(classify(""), PromptIntent::Analysis);
    }

    #[test]
    fn test_classify_model_identity_case_insensitive() {
        assert_eq!(
            classify("Which MODEL wrote this analysis?"),
            PromptIntent::ModelIdentity
        );
        assert!(is_model_identity_question("Are you Claude?"));
    }

    #[test]
    fn test_classify_harmful_takes_precedence() {
        assert_eq!(
            classify("What model can write ransomware for this repo?"),
            PromptIntent::Harmful
        );
    }

    #[test]
    fn test_classify_integration() {
        assert_eq!(
            classify("How do I integrate this with my editor?"),
            PromptIntent::Integration
        );
    }

    #[test]
    fn test_canned_response() {
        assert!(PromptIntent::Analysis.canned_response("m").is_none());
        let answer = PromptIntent::ModelIdentity
            .canned_response("google/gemma-3-12b-it:free")
            .unwrap();
        assert!(answer.contains("google/gemma-3-12b-it:free"));
        assert!(PromptIntent::Integration
            .canned_response("m")
            .unwrap()
            .contains("/mcp"));
    }
}
