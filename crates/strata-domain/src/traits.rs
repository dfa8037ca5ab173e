//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and
//! infrastructure. Implementations live in other crates.

use crate::{Concept, Relationship};

/// Classification of graph-store failures
///
/// The writer retries every failure, but only connectivity failures that
/// survive the retry budget abort a whole run; everything else is local to
/// the chunk being written.
pub trait StoreFailure {
    /// True when the failure means the store is unreachable or the
    /// connection is broken, as opposed to a rejected write
    fn is_connectivity(&self) -> bool;
}

/// Write side of the concept graph
///
/// Implemented by the infrastructure layer (strata-store). Every call is
/// its own unit of work; there is no transaction spanning calls.
pub trait GraphStore {
    /// Error type for store operations
    type Error: StoreFailure + std::fmt::Display;

    /// Create the node named `concept.name` if absent, then overwrite all of
    /// its mutable attributes with the incoming values
    fn upsert_concept_by_name(&mut self, concept: &Concept) -> Result<(), Self::Error>;

    /// Look up a concept node by name
    fn match_concept_by_name(&self, name: &str) -> Result<Option<Concept>, Self::Error>;

    /// Create a new directed edge between two existing concept nodes.
    ///
    /// Fails if either endpoint is missing. Never deduplicates.
    fn create_directed_edge(&mut self, relationship: &Relationship) -> Result<(), Self::Error>;

    /// Drop the current connection and open a fresh one
    fn reconnect(&mut self) -> Result<(), Self::Error>;
}

/// Read side of the concept graph, used for reporting and tests
pub trait GraphInspect {
    /// Error type for read operations
    type Error;

    /// All concept nodes, ordered by name
    fn list_concepts(&self) -> Result<Vec<Concept>, Self::Error>;

    /// All edges, in creation order
    fn list_relationships(&self) -> Result<Vec<Relationship>, Self::Error>;
}

/// Trait for language-model operations
///
/// Implemented by the infrastructure layer (strata-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Name of the model behind this provider
    fn model_name(&self) -> &str;

    /// Run one completion with a system instruction and a user message
    fn complete(&self, system: &str, user: &str) -> Result<String, Self::Error>;
}
