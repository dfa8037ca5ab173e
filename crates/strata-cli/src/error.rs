//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline error
    #[error(transparent)]
    Pipeline(#[from] strata_pipeline::PipelineError),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] strata_llm::LlmError),

    /// Graph store error
    #[error("Store error: {0}")]
    Store(#[from] strata_store::StoreError),

    /// Database container lifecycle error
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
