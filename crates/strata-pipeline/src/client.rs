//! Extraction call against a language model

use crate::error::PipelineError;
use crate::prompt::PromptBuilder;
use std::fmt::Display;
use strata_domain::traits::LlmProvider;
use tracing::debug;

/// Sends one chunk plus its context to the model and returns the raw reply
///
/// No retries here; the pipeline wraps the call in its own retry budget.
pub struct ExtractionClient<L> {
    provider: L,
}

impl<L> ExtractionClient<L>
where
    L: LlmProvider,
    L::Error: Display,
{
    /// Wrap a provider
    pub fn new(provider: L) -> Self {
        Self { provider }
    }

    /// Model behind the provider
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Request an extraction for `chunk`
    pub fn extract(&self, chunk: &str, context: &str) -> Result<String, PipelineError> {
        let prompt = PromptBuilder::new(chunk, context).build();

        debug!(
            model = self.provider.model_name(),
            chunk_chars = chunk.chars().count(),
            context_chars = context.chars().count(),
            "requesting extraction"
        );

        let raw = self
            .provider
            .complete(&prompt.system, &prompt.user)
            .map_err(|e| PipelineError::ExternalService(e.to_string()))?;

        debug!(response_chars = raw.chars().count(), "received extraction");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_llm::{LlmError, MockProvider};

    #[test]
    fn test_extract_returns_raw_reply() {
        let provider = MockProvider::new("raw reply");
        let client = ExtractionClient::new(provider.clone());

        assert_eq!(client.extract("chunk", "ctx").unwrap(), "raw reply");
        assert_eq!(client.model_name(), "mock");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user, "Context: ctx\n\nChunk: chunk");
    }

    #[test]
    fn test_provider_failure_is_external_service_error() {
        let provider = MockProvider::default();
        provider.push_error(LlmError::RateLimitExceeded);
        let client = ExtractionClient::new(provider);

        let err = client.extract("chunk", "").unwrap_err();
        assert_eq!(
            err,
            PipelineError::ExternalService("Rate limit exceeded".to_string())
        );
    }
}
