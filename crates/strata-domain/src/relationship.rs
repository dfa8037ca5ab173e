//! Relationship module
//!
//! Relationships are directed edges `source -> target` between concepts,
//! addressed by concept name. They have no uniqueness key: writing the same
//! relationship twice yields two edges.

use crate::Confidence;
use std::collections::BTreeMap;

/// Strength of the relationship in each direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BidirectionalStrength {
    /// source -> target
    pub forward: Confidence,
    /// target -> source
    pub backward: Confidence,
}

/// When the relationship was observed (ISO-8601 timestamps)
#[derive(Debug, Clone, PartialEq)]
pub struct Temporal {
    /// First observation
    pub first_seen: String,
    /// Most recent observation
    pub last_seen: String,
}

/// Free-text classification tags
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// e.g. "dependency"
    pub category: String,
    /// e.g. "direct"
    pub directness: String,
    /// e.g. "strong"
    pub strength: String,
}

/// How the relationship was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    /// Text the relationship was extracted from
    pub source_context: String,
    /// Name of the extraction method
    pub extraction_method: String,
}

/// Metadata carried on every edge
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMetadata {
    /// Extraction confidence
    pub confidence: Confidence,
    /// Directional strengths
    pub bidirectional_strength: BidirectionalStrength,
    /// Observation window
    pub temporal: Temporal,
    /// Classification tags
    pub classification: Classification,
    /// Origin of the edge
    pub provenance: Provenance,
}

/// A directed, typed connection between two concepts
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Source concept name
    pub source: String,

    /// Free-text type label
    pub relationship_type: String,

    /// Target concept name
    pub target: String,

    /// Edge metadata
    pub metadata: RelationshipMetadata,

    /// Open properties merged onto the edge in addition to the metadata
    pub properties: BTreeMap<String, String>,
}
