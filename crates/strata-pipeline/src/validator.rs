//! Structural validation of model responses
//!
//! Runs on the raw JSON before any typed decoding, so that a malformed reply
//! is reported field by field instead of failing on the first serde error.

use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::fmt::Display;

/// Strip a Markdown code fence around the payload, if present
pub(crate) fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    // Drop the opening fence line (```json or ```) and the closing fence
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return "",
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Check a raw response against the extraction schema
///
/// Every violation is collected, each prefixed with its JSON path, e.g.
/// `analysis.concepts[2].confidence: must be between 0 and 1`.
///
/// Besides the concept `name`, a relationship's `source`, `target` and
/// `type` must be non-empty: an edge without a label cannot be queried.
pub fn validate(raw: &str) -> Result<(), ValidationError> {
    let payload = strip_code_fence(raw);
    let root: Value = serde_json::from_str(payload)
        .map_err(|e| ValidationError::single(format!("response is not valid JSON: {}", e)))?;

    let mut checker = Checker::default();
    checker.check_root(&root);

    if checker.issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            issues: checker.issues,
        })
    }
}

/// RFC 3339, or a date-time or date without a zone offset
fn is_iso8601(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

#[derive(Default)]
struct Checker {
    issues: Vec<String>,
}

impl Checker {
    fn report(&mut self, path: &str, problem: impl Display) {
        self.issues.push(format!("{}: {}", path, problem));
    }

    fn field<'v>(&mut self, obj: &'v Map<String, Value>, path: &str, key: &str) -> Option<&'v Value> {
        let value = obj.get(key);
        if value.is_none() {
            self.report(&join(path, key), "missing required field");
        }
        value
    }

    fn object<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'v Map<String, Value>> {
        let value = self.field(obj, path, key)?;
        let map = value.as_object();
        if map.is_none() {
            self.report(&join(path, key), "must be an object");
        }
        map
    }

    fn array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'v Vec<Value>> {
        let value = self.field(obj, path, key)?;
        let items = value.as_array();
        if items.is_none() {
            self.report(&join(path, key), "must be an array");
        }
        items
    }

    fn text(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if let Some(value) = self.field(obj, path, key) {
            if !value.is_string() {
                self.report(&join(path, key), "must be a string");
            }
        }
    }

    fn name(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if let Some(value) = self.field(obj, path, key) {
            match value.as_str() {
                Some(s) if !s.trim().is_empty() => {}
                Some(_) => self.report(&join(path, key), "must not be empty"),
                None => self.report(&join(path, key), "must be a string"),
            }
        }
    }

    fn probability(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if let Some(value) = self.field(obj, path, key) {
            match value.as_f64() {
                Some(p) if (0.0..=1.0).contains(&p) => {}
                Some(p) => self.report(&join(path, key), format!("{} must be between 0 and 1", p)),
                None => self.report(&join(path, key), "must be a number"),
            }
        }
    }

    fn count(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if let Some(value) = self.field(obj, path, key) {
            if value.as_u64().is_none() {
                self.report(&join(path, key), "must be a non-negative integer");
            }
        }
    }

    fn timestamp(&mut self, obj: &Map<String, Value>, path: &str, key: &str) {
        if let Some(value) = self.field(obj, path, key) {
            match value.as_str() {
                Some(s) => {
                    if !is_iso8601(s) {
                        self.report(&join(path, key), "not an ISO 8601 date or timestamp");
                    }
                }
                None => self.report(&join(path, key), "must be a string"),
            }
        }
    }

    fn check_root(&mut self, root: &Value) {
        let Some(root) = root.as_object() else {
            self.report("$", "response must be a JSON object");
            return;
        };
        let Some(analysis) = self.object(root, "", "analysis") else {
            return;
        };

        if let Some(concepts) = self.array(analysis, "analysis", "concepts") {
            for (i, concept) in concepts.iter().enumerate() {
                self.check_concept(concept, &format!("analysis.concepts[{}]", i));
            }
        }
        if let Some(relationships) = self.array(analysis, "analysis", "relationships") {
            for (i, relationship) in relationships.iter().enumerate() {
                self.check_relationship(relationship, &format!("analysis.relationships[{}]", i));
            }
        }
    }

    fn check_concept(&mut self, value: &Value, path: &str) {
        let Some(concept) = value.as_object() else {
            self.report(path, "must be an object");
            return;
        };

        self.name(concept, path, "name");
        self.text(concept, path, "type");
        self.text(concept, path, "description");
        self.probability(concept, path, "confidence");
        self.count(concept, path, "version");

        let source_path = join(path, "source");
        if let Some(source) = self.object(concept, path, "source") {
            self.count(source, &source_path, "position");
            self.text(source, &source_path, "context");
        }

        let hierarchy_path = join(path, "hierarchy");
        if let Some(hierarchy) = self.object(concept, path, "hierarchy") {
            match hierarchy.get("parent") {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => self.report(&join(&hierarchy_path, "parent"), "must be a string or null"),
            }
            self.count(hierarchy, &hierarchy_path, "level");
        }

        let references_path = join(path, "references");
        if let Some(references) = self.array(concept, path, "references") {
            for (i, reference) in references.iter().enumerate() {
                if !reference.is_string() {
                    self.report(&format!("{}[{}]", references_path, i), "must be a string");
                }
            }
        }
    }

    fn check_relationship(&mut self, value: &Value, path: &str) {
        let Some(relationship) = value.as_object() else {
            self.report(path, "must be an object");
            return;
        };

        self.name(relationship, path, "source");
        self.name(relationship, path, "type");
        self.name(relationship, path, "target");

        let metadata_path = join(path, "metadata");
        if let Some(metadata) = self.object(relationship, path, "metadata") {
            self.check_metadata(metadata, &metadata_path);
        }

        let properties_path = join(path, "properties");
        if let Some(properties) = self.array(relationship, path, "properties") {
            for (i, property) in properties.iter().enumerate() {
                let property_path = format!("{}[{}]", properties_path, i);
                match property.as_object() {
                    Some(property) => {
                        self.name(property, &property_path, "name");
                        self.text(property, &property_path, "value");
                    }
                    None => self.report(&property_path, "must be an object"),
                }
            }
        }
    }

    fn check_metadata(&mut self, metadata: &Map<String, Value>, path: &str) {
        self.probability(metadata, path, "confidence");

        let strength_path = join(path, "bidirectional_strength");
        if let Some(strength) = self.object(metadata, path, "bidirectional_strength") {
            self.probability(strength, &strength_path, "forward");
            self.probability(strength, &strength_path, "backward");
        }

        let temporal_path = join(path, "temporal");
        if let Some(temporal) = self.object(metadata, path, "temporal") {
            self.timestamp(temporal, &temporal_path, "first_seen");
            self.timestamp(temporal, &temporal_path, "last_seen");
        }

        let classification_path = join(path, "classification");
        if let Some(classification) = self.object(metadata, path, "classification") {
            for key in ["category", "directness", "strength"] {
                self.text(classification, &classification_path, key);
            }
        }

        let provenance_path = join(path, "provenance");
        if let Some(provenance) = self.object(metadata, path, "provenance") {
            self.text(provenance, &provenance_path, "source_context");
            self.text(provenance, &provenance_path, "extraction_method");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_response() -> Value {
        json!({"analysis": {
            "concepts": [{
                "name": "Tokio",
                "type": "library",
                "description": "Async runtime",
                "confidence": 0.95,
                "source": {"position": 12, "context": "Tokio is"},
                "hierarchy": {"parent": "Rust", "level": 1},
                "version": 1,
                "references": ["Rust"]
            }],
            "relationships": [{
                "source": "Tokio",
                "type": "part_of",
                "target": "Rust",
                "metadata": {
                    "confidence": 0.9,
                    "bidirectional_strength": {"forward": 0.85, "backward": 0.75},
                    "temporal": {"first_seen": "2024-01-26T13:45:00Z", "last_seen": "2024-01-26T13:45:00Z"},
                    "classification": {"category": "dependency", "directness": "direct", "strength": "strong"},
                    "provenance": {"source_context": "Tokio is", "extraction_method": "llm_analysis"}
                },
                "properties": [{"name": "since", "value": "2016"}]
            }]
        }})
    }

    fn issues(value: &Value) -> Vec<String> {
        validate(&value.to_string()).unwrap_err().issues
    }

    #[test]
    fn test_valid_response_passes() {
        assert!(validate(&valid_response().to_string()).is_ok());
    }

    #[test]
    fn test_empty_arrays_pass() {
        assert!(validate(r#"{"analysis": {"concepts": [], "relationships": []}}"#).is_ok());
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let fenced = format!("```json\n{}\n```", valid_response());
        assert!(validate(&fenced).is_ok());

        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
        assert_eq!(strip_code_fence("```"), "");
    }

    #[test]
    fn test_not_json() {
        let err = validate("<analysis></analysis>").unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].starts_with("response is not valid JSON"));
    }

    #[test]
    fn test_missing_analysis() {
        assert_eq!(issues(&json!({"concepts": []})), vec!["analysis: missing required field"]);
        assert_eq!(issues(&json!([1, 2])), vec!["$: response must be a JSON object"]);
    }

    #[test]
    fn test_missing_concept_confidence() {
        let mut value = valid_response();
        value["analysis"]["concepts"][0]
            .as_object_mut()
            .unwrap()
            .remove("confidence");

        assert_eq!(
            issues(&value),
            vec!["analysis.concepts[0].confidence: missing required field"]
        );
    }

    #[test]
    fn test_all_violations_are_reported() {
        let mut value = valid_response();
        value["analysis"]["concepts"][0]["confidence"] = json!("high");
        value["analysis"]["concepts"][0]["hierarchy"]["level"] = json!(-1);
        value["analysis"]["relationships"][0]["metadata"]["bidirectional_strength"]["backward"] =
            json!(1.5);
        value["analysis"]["relationships"][0]["target"] = json!("");

        let found = issues(&value);
        assert_eq!(found.len(), 4, "{:?}", found);
        assert!(found.contains(&"analysis.concepts[0].confidence: must be a number".to_string()));
        assert!(found
            .contains(&"analysis.concepts[0].hierarchy.level: must be a non-negative integer".to_string()));
        assert!(found.contains(
            &"analysis.relationships[0].metadata.bidirectional_strength.backward: 1.5 must be between 0 and 1"
                .to_string()
        ));
        assert!(found.contains(&"analysis.relationships[0].target: must not be empty".to_string()));
    }

    #[test]
    fn test_parent_may_be_absent_or_null() {
        let mut value = valid_response();
        value["analysis"]["concepts"][0]["hierarchy"]["parent"] = Value::Null;
        assert!(validate(&value.to_string()).is_ok());

        value["analysis"]["concepts"][0]["hierarchy"]
            .as_object_mut()
            .unwrap()
            .remove("parent");
        assert!(validate(&value.to_string()).is_ok());

        value["analysis"]["concepts"][0]["hierarchy"]["parent"] = json!(7);
        assert_eq!(
            issues(&value),
            vec!["analysis.concepts[0].hierarchy.parent: must be a string or null"]
        );
    }

    #[test]
    fn test_bad_timestamp() {
        let mut value = valid_response();
        value["analysis"]["relationships"][0]["metadata"]["temporal"]["first_seen"] =
            json!("yesterday");

        let found = issues(&value);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0],
            "analysis.relationships[0].metadata.temporal.first_seen: not an ISO 8601 date or timestamp"
        );
    }

    #[test]
    fn test_timestamps_without_offset_pass() {
        let mut value = valid_response();
        let temporal = &mut value["analysis"]["relationships"][0]["metadata"]["temporal"];
        temporal["first_seen"] = json!("2024-01-26T13:45:00");
        temporal["last_seen"] = json!("2024-01-26");
        assert!(validate(&value.to_string()).is_ok());

        value["analysis"]["relationships"][0]["metadata"]["temporal"]["last_seen"] =
            json!("2024-01-26T13:45:00.250");
        assert!(validate(&value.to_string()).is_ok());
    }

    #[test]
    fn test_empty_relationship_type_rejected() {
        let mut value = valid_response();
        value["analysis"]["relationships"][0]["type"] = json!(" ");
        assert_eq!(
            issues(&value),
            vec!["analysis.relationships[0].type: must not be empty"]
        );
    }

    #[test]
    fn test_fractional_position_rejected() {
        let mut value = valid_response();
        value["analysis"]["concepts"][0]["source"]["position"] = json!(1.5);
        assert_eq!(
            issues(&value),
            vec!["analysis.concepts[0].source.position: must be a non-negative integer"]
        );
    }

    #[test]
    fn test_property_shape() {
        let mut value = valid_response();
        value["analysis"]["relationships"][0]["properties"] = json!([{"name": "k"}, "loose"]);

        assert_eq!(
            issues(&value),
            vec![
                "analysis.relationships[0].properties[0].value: missing required field",
                "analysis.relationships[0].properties[1]: must be an object",
            ]
        );
    }
}
