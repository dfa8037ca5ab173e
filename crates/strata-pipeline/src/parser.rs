//! Typed decoding of validated model responses

use crate::error::{PipelineError, ValidationError};
use crate::types::Extraction;
use crate::validator::{strip_code_fence, validate};
use serde::Deserialize;
use std::collections::BTreeMap;
use strata_domain::{
    BidirectionalStrength, Classification, Concept, Confidence, Hierarchy, Provenance,
    Relationship, RelationshipMetadata, SourceRef, Temporal,
};

#[derive(Deserialize)]
struct WireResponse {
    analysis: WireAnalysis,
}

#[derive(Deserialize)]
struct WireAnalysis {
    concepts: Vec<WireConcept>,
    relationships: Vec<WireRelationship>,
}

#[derive(Deserialize)]
struct WireConcept {
    name: String,
    #[serde(rename = "type")]
    concept_type: String,
    description: String,
    confidence: f64,
    source: WireSource,
    hierarchy: WireHierarchy,
    version: u64,
    references: Vec<String>,
}

#[derive(Deserialize)]
struct WireSource {
    position: u64,
    context: String,
}

#[derive(Deserialize)]
struct WireHierarchy {
    #[serde(default)]
    parent: Option<String>,
    level: u32,
}

#[derive(Deserialize)]
struct WireRelationship {
    source: String,
    #[serde(rename = "type")]
    relationship_type: String,
    target: String,
    metadata: WireMetadata,
    properties: Vec<WireProperty>,
}

#[derive(Deserialize)]
struct WireMetadata {
    confidence: f64,
    bidirectional_strength: WireStrength,
    temporal: WireTemporal,
    classification: WireClassification,
    provenance: WireProvenance,
}

#[derive(Deserialize)]
struct WireTemporal {
    first_seen: String,
    last_seen: String,
}

#[derive(Deserialize)]
struct WireClassification {
    category: String,
    directness: String,
    strength: String,
}

#[derive(Deserialize)]
struct WireProvenance {
    source_context: String,
    extraction_method: String,
}

#[derive(Deserialize)]
struct WireStrength {
    forward: f64,
    backward: f64,
}

#[derive(Deserialize)]
struct WireProperty {
    name: String,
    value: String,
}

fn confidence(value: f64, path: &str) -> Result<Confidence, ValidationError> {
    Confidence::new(value).map_err(|e| ValidationError::single(format!("{}: {}", path, e)))
}

impl WireConcept {
    fn into_concept(self, index: usize) -> Result<Concept, ValidationError> {
        let path = format!("analysis.concepts[{}].confidence", index);
        // An empty parent means "no parent"
        let parent = self.hierarchy.parent.filter(|p| !p.trim().is_empty());

        Ok(Concept {
            name: self.name,
            concept_type: self.concept_type,
            description: self.description,
            confidence: confidence(self.confidence, &path)?,
            source: SourceRef {
                position: self.source.position,
                context: self.source.context,
            },
            hierarchy: Hierarchy {
                parent,
                level: self.hierarchy.level,
            },
            version: self.version,
            references: self.references,
        })
    }
}

impl WireRelationship {
    fn into_relationship(self, index: usize) -> Result<Relationship, ValidationError> {
        let path = format!("analysis.relationships[{}].metadata", index);
        let metadata = self.metadata;

        // Later duplicates of a key overwrite earlier ones
        let properties: BTreeMap<String, String> = self
            .properties
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect();

        Ok(Relationship {
            source: self.source,
            relationship_type: self.relationship_type,
            target: self.target,
            metadata: RelationshipMetadata {
                confidence: confidence(metadata.confidence, &format!("{}.confidence", path))?,
                bidirectional_strength: BidirectionalStrength {
                    forward: confidence(
                        metadata.bidirectional_strength.forward,
                        &format!("{}.bidirectional_strength.forward", path),
                    )?,
                    backward: confidence(
                        metadata.bidirectional_strength.backward,
                        &format!("{}.bidirectional_strength.backward", path),
                    )?,
                },
                temporal: Temporal {
                    first_seen: metadata.temporal.first_seen,
                    last_seen: metadata.temporal.last_seen,
                },
                classification: Classification {
                    category: metadata.classification.category,
                    directness: metadata.classification.directness,
                    strength: metadata.classification.strength,
                },
                provenance: Provenance {
                    source_context: metadata.provenance.source_context,
                    extraction_method: metadata.provenance.extraction_method,
                },
            },
            properties,
        })
    }
}

/// Decode a response into concepts and relationships, in response order
///
/// Meant to run after [`validate`]; a shape problem that slips through still
/// surfaces as a validation error rather than a partial record.
pub fn parse(raw: &str) -> Result<Extraction, PipelineError> {
    let payload = strip_code_fence(raw);
    let response: WireResponse = serde_json::from_str(payload)
        .map_err(|e| ValidationError::single(format!("response does not match schema: {}", e)))?;

    let concepts = response
        .analysis
        .concepts
        .into_iter()
        .enumerate()
        .map(|(i, c)| c.into_concept(i))
        .collect::<Result<Vec<_>, _>>()?;

    let relationships = response
        .analysis
        .relationships
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_relationship(i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Extraction {
        concepts,
        relationships,
    })
}

/// Validate, then parse
pub fn decode_response(raw: &str) -> Result<Extraction, PipelineError> {
    validate(raw)?;
    parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"```json
{"analysis": {
  "concepts": [
    {"name": "Tokio", "type": "library", "description": "Async runtime",
     "confidence": 0.95, "source": {"position": 12, "context": "Tokio is"},
     "hierarchy": {"parent": "Rust", "level": 1}, "version": 2,
     "references": ["Rust", "Futures"]},
    {"name": "Rust", "type": "language", "description": "Systems language",
     "confidence": 0.9, "source": {"position": 0, "context": "Rust"},
     "hierarchy": {"parent": "", "level": 0}, "version": 1, "references": []}
  ],
  "relationships": [
    {"source": "Tokio", "type": "part_of", "target": "Rust",
     "metadata": {"confidence": 0.9,
                  "bidirectional_strength": {"forward": 0.85, "backward": 0.75},
                  "temporal": {"first_seen": "2024-01-26T13:45:00Z", "last_seen": "2024-01-27T08:00:00Z"},
                  "classification": {"category": "dependency", "directness": "direct", "strength": "strong"},
                  "provenance": {"source_context": "Tokio is", "extraction_method": "llm_analysis"}},
     "properties": [{"name": "since", "value": "2016"}, {"name": "since", "value": "2017"}]}
  ]
}}
```"#;

    #[test]
    fn test_parse_full_response() {
        let extraction = decode_response(RESPONSE).unwrap();
        assert_eq!(extraction.concepts.len(), 2);
        assert_eq!(extraction.relationships.len(), 1);

        let tokio = &extraction.concepts[0];
        assert_eq!(tokio.name, "Tokio");
        assert_eq!(tokio.concept_type, "library");
        assert_eq!(tokio.confidence.value(), 0.95);
        assert_eq!(tokio.source.position, 12);
        assert_eq!(tokio.hierarchy.parent.as_deref(), Some("Rust"));
        assert_eq!(tokio.hierarchy.level, 1);
        assert_eq!(tokio.version, 2);
        assert_eq!(tokio.references, vec!["Rust", "Futures"]);

        let rel = &extraction.relationships[0];
        assert_eq!(rel.relationship_type, "part_of");
        assert_eq!(rel.metadata.bidirectional_strength.backward.value(), 0.75);
        assert_eq!(rel.metadata.temporal.last_seen, "2024-01-27T08:00:00Z");
        assert_eq!(rel.metadata.classification.directness, "direct");
        assert_eq!(rel.metadata.provenance.extraction_method, "llm_analysis");
    }

    #[test]
    fn test_empty_parent_is_absent() {
        let extraction = decode_response(RESPONSE).unwrap();
        assert_eq!(extraction.concepts[1].hierarchy.parent, None);
        assert!(!extraction.concepts[1].has_parent());
    }

    #[test]
    fn test_duplicate_property_keeps_last() {
        let extraction = decode_response(RESPONSE).unwrap();
        let properties = &extraction.relationships[0].properties;
        assert_eq!(properties.len(), 1);
        assert_eq!(properties.get("since").map(String::as_str), Some("2017"));
    }

    #[test]
    fn test_invalid_response_never_parses_partially() {
        let raw = RESPONSE.replace(r#""confidence": 0.95, "#, "");
        match decode_response(&raw) {
            Err(PipelineError::Validation(e)) => {
                assert_eq!(e.issues, vec!["analysis.concepts[0].confidence: missing required field"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_alone_rejects_out_of_range_confidence() {
        let raw = RESPONSE.replace("0.95", "1.95");
        assert!(matches!(parse(&raw), Err(PipelineError::Validation(_))));
    }
}
