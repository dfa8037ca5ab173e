//! Extraction request construction

/// A ready-to-send extraction request
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Fixed instruction describing the response shape
    pub system: String,
    /// Context rendering plus the chunk text
    pub user: String,
}

/// Builds the extraction request for one chunk
pub struct PromptBuilder<'a> {
    chunk: &'a str,
    context: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for `chunk`, primed with a rendered context window
    pub fn new(chunk: &'a str, context: &'a str) -> Self {
        Self { chunk, context }
    }

    /// Build the request
    pub fn build(&self) -> Prompt {
        Prompt {
            system: EXTRACTION_INSTRUCTIONS.to_string(),
            user: format!("Context: {}\n\nChunk: {}", self.context, self.chunk),
        }
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"Analyze technical documentation and return results as a single JSON object in the following format:

{
  "analysis": {
    "concepts": [
      {
        "name": "concept_name",
        "type": "concept_type",
        "description": "description",
        "confidence": 0.95,
        "source": {"position": 1234, "context": "surrounding text for context"},
        "hierarchy": {"parent": "parent_concept", "level": 1},
        "version": 1,
        "references": ["related_concept"]
      }
    ],
    "relationships": [
      {
        "source": "source_concept",
        "type": "relationship_type",
        "target": "target_concept",
        "metadata": {
          "confidence": 0.90,
          "bidirectional_strength": {"forward": 0.85, "backward": 0.75},
          "temporal": {"first_seen": "2024-01-26T13:45:00Z", "last_seen": "2024-01-26T13:45:00Z"},
          "classification": {"category": "dependency", "directness": "direct", "strength": "strong"},
          "provenance": {"source_context": "contextual information", "extraction_method": "llm_analysis"}
        },
        "properties": [{"name": "additional_info", "value": "value"}]
      }
    ]
  }
}

Guidelines for analysis:
1. Assign confidence scores between 0.0 and 1.0 based on clarity and context
2. Use hierarchical classification for concepts; use null for a concept without a parent
3. Track relationship directionality and strength
4. Provide detailed context for provenance
5. Classify relationships by type and directness
6. Only relate concepts that appear in the "concepts" list of the same response
7. Timestamps must be RFC 3339

Output the JSON object only, with no additional text."#;
