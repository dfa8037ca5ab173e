//! Strata Domain Layer
//!
//! This crate contains the domain model shared by every other Strata crate.
//! It has ZERO external dependencies and defines the records produced by
//! extraction and the trait interfaces that infrastructure implements.
//!
//! ## Key Concepts
//!
//! - **Concept**: A named entity extracted from a document, keyed by `name`
//! - **Relationship**: A directed, typed edge between two concepts
//! - **Confidence**: A score in [0, 1], checked at construction
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure data and validation only
//! - Language-model and graph-store implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod concept;
pub mod confidence;
pub mod relationship;
pub mod traits;

// Re-exports for convenience
pub use concept::{Concept, Hierarchy, SourceRef};
pub use confidence::{Confidence, ConfidenceError};
pub use relationship::{
    BidirectionalStrength, Classification, Provenance, Relationship, RelationshipMetadata,
    Temporal,
};
pub use traits::{GraphInspect, GraphStore, LlmProvider, StoreFailure};
