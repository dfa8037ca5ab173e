//! Error types for the pipeline

use std::fmt;
use thiserror::Error;

/// Structural problems found in a model response
///
/// Every violation is collected, each prefixed with its JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// One entry per violation
    pub issues: Vec<String>,
}

impl ValidationError {
    /// A validation error with a single issue
    pub fn single(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.issues.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur while processing a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The graph store is unreachable; fatal for the whole run once retries
    /// are exhausted
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The extraction service failed
    #[error("External service error: {0}")]
    ExternalService(String),

    /// The model's output does not have the required shape
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// The store rejected a write or an endpoint is missing
    #[error("Graph write error: {0}")]
    GraphWrite(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The document could not be read
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<ValidationError> for PipelineError {
    fn from(e: ValidationError) -> Self {
        PipelineError::Validation(e)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e.to_string())
    }
}
