//! Concept module
//!
//! A concept is the node type of the graph. Its `name` is the natural
//! primary key: writing a concept whose name already exists updates that
//! node instead of creating a second one.

use crate::Confidence;

/// Where in the document a concept was seen
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef {
    /// Character offset reported by the extractor
    pub position: u64,

    /// Surrounding text
    pub context: String,
}

/// Position of a concept in the concept hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    /// Parent concept name (weak reference: the parent need not exist)
    pub parent: Option<String>,

    /// Depth in the hierarchy
    pub level: u32,
}

/// A named entity extracted from a document
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    /// Unique key
    pub name: String,

    /// Free-text type label
    pub concept_type: String,

    /// Free-text description
    pub description: String,

    /// Extraction confidence
    pub confidence: Confidence,

    /// Provenance within the document
    pub source: SourceRef,

    /// Hierarchical placement
    pub hierarchy: Hierarchy,

    /// Version as reported by the extractor for this mention.
    /// Stored as-is; never compared against a previously stored version.
    pub version: u64,

    /// Related concept names (weak references)
    pub references: Vec<String>,
}

impl Concept {
    /// Whether this concept has a hierarchy parent
    pub fn has_parent(&self) -> bool {
        self.hierarchy.parent.is_some()
    }
}
