//! OpenRouter API client implementation.

use async_trait::async_trait;
use gitbridge_core::{CompletionProvider, Error, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::prompts::{CONTEXT_ACK, SYSTEM_PROMPT};
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenRouterErrorBody,
};
use crate::{DEFAULT_MODEL, DEFAULT_OPENROUTER_URL};

/// OpenRouter chat-completions client.
pub struct OpenRouterClient {
    base_url: String,
    api_key: String,
    model: String,
    referer: Option<String>,
    client: reqwest::Client,
}

impl OpenRouterClient {
    /// Create a new client against the public OpenRouter endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_OPENROUTER_URL, api_key)
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            referer: None,
            client: reqwest::Client::new(),
        }
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send `HTTP-Referer` with every request (OpenRouter app attribution).
    pub fn with_referer(mut self, referer: Option<String>) -> Self {
        self.referer = referer;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the message list for a prompt and optional tool context.
    pub fn build_messages(prompt: &str, context: Option<&Value>) -> Result<Vec<ChatMessage>> {
        let mut messages = vec![
            ChatMessage::new("system", SYSTEM_PROMPT),
            ChatMessage::new("user", prompt),
        ];

        if let Some(context) = context {
            messages.push(ChatMessage::new("assistant", CONTEXT_ACK));
            messages.push(ChatMessage::new(
                "tool",
                serde_json::to_string_pretty(context)?,
            ));
        }

        Ok(messages)
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenRouterErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            warn!(
                status = status_code,
                message = message.as_str(),
                "OpenRouter API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::InvalidData("completion returned no choices".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    fn provider_name(&self) -> &'static str {
        "openrouter"
    }

    async fn complete(&self, prompt: &str, context: Option<&Value>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::build_messages(prompt, context)?,
        };

        debug!(url = url.as_str(), model = self.model.as_str(), "OpenRouter completion request");

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request);
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }
}
