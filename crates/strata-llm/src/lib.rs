//! Strata LLM Provider Layer
//!
//! Pluggable language-model providers for concept extraction.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `strata-domain`.
//! The pipeline only ever sees the trait, so providers can be swapped freely.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted, deterministic responses for testing
//! - `ChatProvider`: Any OpenAI-compatible `/chat/completions` endpoint (DeepSeek by default)
//!
//! # Examples
//!
//! ```
//! use strata_llm::MockProvider;
//! use strata_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("{}");
//! let result = provider.complete("system", "user").unwrap();
//! assert_eq!(result, "{}");
//! ```

#![warn(missing_docs)]

pub mod chat;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use strata_domain::traits::LlmProvider as LlmProviderTrait;
use thiserror::Error;

pub use chat::ChatProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// One recorded call to a [`MockProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// System instruction
    pub system: String,
    /// User message
    pub user: String,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Result<String, LlmError>>,
    calls: Vec<RecordedCall>,
}

/// Mock LLM provider for deterministic testing
///
/// Scripted replies are consumed in order, one per call. Once the script is
/// exhausted every call gets the default response.
///
/// # Examples
///
/// ```
/// use strata_llm::{LlmError, MockProvider};
/// use strata_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("fallback");
/// provider.push_error(LlmError::Other("boom".into()));
/// provider.push_response("first");
///
/// assert!(provider.complete("s", "u").is_err());
/// assert_eq!(provider.complete("s", "u").unwrap(), "first");
/// assert_eq!(provider.complete("s", "u").unwrap(), "fallback");
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all calls
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a successful reply
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().script.push_back(Ok(response.into()));
    }

    /// Queue a failed reply
    pub fn push_error(&self, error: LlmError) {
        self.state().script.push_back(Err(error));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        "mock"
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.calls.push(RecordedCall {
            system: system.to_string(),
            user: user.to_string(),
        });

        match state.script.pop_front() {
            Some(reply) => reply,
            None => Ok(self.default_response.clone()),
        }
    }
}
