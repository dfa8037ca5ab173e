//! OpenAI-compatible chat provider
//!
//! Talks to any endpoint implementing `POST {base}/chat/completions`.
//! DeepSeek is the default; OpenAI, vLLM and Ollama's compatibility layer
//! work with a different base URL.
//!
//! # Examples
//!
//! ```no_run
//! use strata_llm::ChatProvider;
//! use strata_domain::traits::LlmProvider;
//!
//! let provider = ChatProvider::new("https://api.deepseek.com", "deepseek-chat")
//!     .unwrap()
//!     .with_api_key("sk-...");
//! let reply = provider.complete("You are terse.", "Say hello").unwrap();
//! ```

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strata_domain::traits::LlmProvider as LlmProviderTrait;
use tokio::runtime::Runtime;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com";

/// Default model
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Default timeout for LLM requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Chat-completions provider
///
/// Makes exactly one request per call. Retrying is the caller's business.
pub struct ChatProvider {
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    api_key: Option<String>,
    client: reqwest::Client,
    runtime: Runtime,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatProvider {
    /// Create a new provider with the default timeout
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL (e.g., "https://api.deepseek.com")
    /// - `model`: Model to use (e.g., "deepseek-chat")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new provider with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("failed to build HTTP client: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Other(format!("failed to start runtime: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: None,
            api_key: None,
            client,
            runtime,
        })
    }

    /// Send `Authorization: Bearer <key>` on every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    /// Run one chat completion
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The endpoint is unreachable or times out
    /// - The model is unknown (HTTP 404)
    /// - The service is rate limiting (HTTP 429)
    /// - The response body has no message content
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message { role: "system", content: system },
                Message { role: "user", content: user },
            ],
            stream: false,
            temperature: self.temperature,
        };

        debug!(model = %self.model, user_len = user.len(), "sending chat completion request");

        let mut request = self.client.post(self.url()).json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("empty or missing content".to_string()))?;

        debug!(response_len = content.len(), "received chat completion");
        Ok(content)
    }
}

impl LlmProviderTrait for ChatProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, Self::Error> {
        // Blocking wrapper for the async request
        self.runtime.block_on(self.chat(system, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_provider_creation() {
        let provider = ChatProvider::new("https://api.deepseek.com/", "deepseek-chat").unwrap();
        assert_eq!(provider.endpoint, "https://api.deepseek.com");
        assert_eq!(provider.model_name(), "deepseek-chat");
        assert_eq!(provider.url(), "https://api.deepseek.com/chat/completions");
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_chat_provider_builders() {
        let provider = ChatProvider::new(DEFAULT_ENDPOINT, DEFAULT_MODEL)
            .unwrap()
            .with_api_key("secret")
            .with_temperature(0.2);
        assert_eq!(provider.api_key.as_deref(), Some("secret"));
        assert_eq!(provider.temperature, Some(0.2));
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatCompletionRequest {
            model: "m",
            messages: vec![Message { role: "system", content: "s" }],
            stream: false,
            temperature: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_unreachable_endpoint_is_communication_error() {
        // Use invalid endpoint to trigger error
        let provider = ChatProvider::with_timeout(
            "http://localhost:99999",
            "deepseek-chat",
            Duration::from_secs(2),
        )
        .unwrap();

        match provider.complete("system", "user") {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }

    // Integration test (requires network and DEEPSEEK_API_KEY)
    #[test]
    #[ignore]
    fn test_chat_integration() {
        let key = std::env::var("DEEPSEEK_API_KEY").unwrap();
        let provider = ChatProvider::new(DEFAULT_ENDPOINT, DEFAULT_MODEL)
            .unwrap()
            .with_api_key(key);
        let reply = provider.complete("Answer with one word.", "Say hello").unwrap();
        assert!(!reply.is_empty());
    }
}
