//! Output formatting for the CLI.

use crate::error::Result;
use colored::*;
use strata_domain::{Concept, Relationship};
use strata_pipeline::RunReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the outcome of a document run.
    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            let failures: Vec<serde_json::Value> = report
                .failures
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "chunk": f.index,
                        "stage": f.stage.to_string(),
                        "error": f.error.to_string(),
                    })
                })
                .collect();
            let value = serde_json::json!({
                "chunks_total": report.chunks_total,
                "chunks_succeeded": report.chunks_succeeded,
                "concepts_written": report.concepts_written,
                "relationships_written": report.relationships_written,
                "failures": failures,
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut lines = Vec::new();
        let summary = format!(
            "Processed {}/{} chunks: {} concept(s), {} relationship(s) written",
            report.chunks_succeeded,
            report.chunks_total,
            report.concepts_written,
            report.relationships_written
        );
        if report.is_complete() {
            lines.push(self.success(&summary));
        } else {
            lines.push(self.warning(&summary));
            for failure in &report.failures {
                lines.push(self.error(&format!(
                    "chunk {} failed while {}: {}",
                    failure.index, failure.stage, failure.error
                )));
            }
        }
        Ok(lines.join("\n"))
    }

    /// Format concept nodes.
    pub fn format_concepts(&self, concepts: &[Concept]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> = concepts.iter().map(concept_json).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => {
                if concepts.is_empty() {
                    return Ok(self.colorize("No concepts found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Name", "Type", "Confidence", "Parent", "Level", "Version"]);
                for concept in concepts {
                    builder.push_record([
                        concept.name.clone(),
                        concept.concept_type.clone(),
                        concept.confidence.to_string(),
                        concept.hierarchy.parent.clone().unwrap_or_default(),
                        concept.hierarchy.level.to_string(),
                        concept.version.to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format relationship edges.
    pub fn format_relationships(&self, relationships: &[Relationship]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> =
                    relationships.iter().map(relationship_json).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => {
                if relationships.is_empty() {
                    return Ok(self.colorize("No relationships found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Source", "Type", "Target", "Confidence", "Strength", "Category"]);
                for rel in relationships {
                    let metadata = &rel.metadata;
                    builder.push_record([
                        rel.source.clone(),
                        rel.relationship_type.clone(),
                        rel.target.clone(),
                        metadata.confidence.to_string(),
                        format!(
                            "{} / {}",
                            metadata.bidirectional_strength.forward,
                            metadata.bidirectional_strength.backward
                        ),
                        metadata.classification.category.clone(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format the whole graph: concepts, relationships and hierarchy.
    pub fn format_graph(&self, concepts: &[Concept], relationships: &[Relationship]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let value = serde_json::json!({
                "concepts": concepts.iter().map(concept_json).collect::<Vec<_>>(),
                "relationships": relationships.iter().map(relationship_json).collect::<Vec<_>>(),
                "hierarchy": hierarchy(concepts).into_iter().map(hierarchy_json).collect::<Vec<_>>(),
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let sections = [
            self.heading("Concepts"),
            self.format_concepts(concepts)?,
            self.heading("Relationships"),
            self.format_relationships(relationships)?,
            self.heading("Hierarchy"),
            self.format_hierarchy(concepts)?,
        ];
        Ok(sections.join("\n\n"))
    }

    /// Format the concept hierarchy: concepts with a parent, by level.
    pub fn format_hierarchy(&self, concepts: &[Concept]) -> Result<String> {
        let children = hierarchy(concepts);

        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> =
                    children.into_iter().map(hierarchy_json).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => {
                if children.is_empty() {
                    return Ok(self.colorize("No hierarchy found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Concept", "Parent", "Level"]);
                for concept in children {
                    builder.push_record([
                        concept.name.clone(),
                        concept.hierarchy.parent.clone().unwrap_or_default(),
                        concept.hierarchy.level.to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a section heading.
    pub fn heading(&self, title: &str) -> String {
        if self.color_enabled {
            format!("=== {} ===", title).bold().to_string()
        } else {
            format!("=== {} ===", title)
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Concepts that have a parent, ordered by level
fn hierarchy(concepts: &[Concept]) -> Vec<&Concept> {
    let mut children: Vec<&Concept> = concepts.iter().filter(|c| c.has_parent()).collect();
    children.sort_by_key(|c| c.hierarchy.level);
    children
}

fn hierarchy_json(c: &Concept) -> serde_json::Value {
    serde_json::json!({
        "concept": c.name,
        "parent": c.hierarchy.parent,
        "level": c.hierarchy.level,
    })
}

fn concept_json(c: &Concept) -> serde_json::Value {
    serde_json::json!({
        "name": c.name,
        "type": c.concept_type,
        "description": c.description,
        "confidence": c.confidence.value(),
        "source": {"position": c.source.position, "context": c.source.context},
        "hierarchy": {"parent": c.hierarchy.parent, "level": c.hierarchy.level},
        "version": c.version,
        "references": c.references,
    })
}

fn relationship_json(r: &Relationship) -> serde_json::Value {
    let m = &r.metadata;
    serde_json::json!({
        "source": r.source,
        "type": r.relationship_type,
        "target": r.target,
        "metadata": {
            "confidence": m.confidence.value(),
            "bidirectional_strength": {
                "forward": m.bidirectional_strength.forward.value(),
                "backward": m.bidirectional_strength.backward.value(),
            },
            "temporal": {"first_seen": m.temporal.first_seen, "last_seen": m.temporal.last_seen},
            "classification": {
                "category": m.classification.category,
                "directness": m.classification.directness,
                "strength": m.classification.strength,
            },
            "provenance": {
                "source_context": m.provenance.source_context,
                "extraction_method": m.provenance.extraction_method,
            },
        },
        "properties": r.properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_domain::{Confidence, Hierarchy, SourceRef};
    use strata_pipeline::{ChunkFailure, ChunkStage, PipelineError};

    fn concept(name: &str, parent: Option<&str>, level: u32) -> Concept {
        Concept {
            name: name.to_string(),
            concept_type: "component".to_string(),
            description: "desc".to_string(),
            confidence: Confidence::new(0.8).unwrap(),
            source: SourceRef {
                position: 1,
                context: "ctx".to_string(),
            },
            hierarchy: Hierarchy {
                parent: parent.map(str::to_string),
                level,
            },
            version: 1,
            references: vec![],
        }
    }

    #[test]
    fn test_report_summary() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = RunReport {
            chunks_total: 3,
            chunks_succeeded: 2,
            concepts_written: 5,
            relationships_written: 1,
            failures: vec![ChunkFailure {
                index: 1,
                stage: ChunkStage::Validating,
                error: PipelineError::Validation(strata_pipeline::ValidationError::single(
                    "analysis: missing required field",
                )),
            }],
        };

        let output = formatter.format_report(&report).unwrap();
        assert!(output.starts_with("⚠ Processed 2/3 chunks: 5 concept(s), 1 relationship(s) written"));
        assert!(output.contains("✗ chunk 1 failed while validating"));
    }

    #[test]
    fn test_report_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&RunReport::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["chunks_total"], 0);
        assert!(value["failures"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_concept_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_concepts(&[concept("Parser", Some("Compiler"), 2)])
            .unwrap();
        assert!(output.contains("Parser"));
        assert!(output.contains("Compiler"));
        assert!(output.contains("0.80"));
    }

    #[test]
    fn test_empty_concepts() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.format_concepts(&[]).unwrap(), "No concepts found.");
        assert_eq!(
            formatter.format_relationships(&[]).unwrap(),
            "No relationships found."
        );
    }

    #[test]
    fn test_hierarchy_orders_by_level() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let concepts = vec![
            concept("Deep", Some("Mid"), 3),
            concept("Root", None, 0),
            concept("Mid", Some("Root"), 1),
        ];

        let output = formatter.format_hierarchy(&concepts).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let names: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["concept"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Mid", "Deep"]);
    }

    #[test]
    fn test_graph_sections() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_graph(&[concept("Root", None, 0)], &[])
            .unwrap();
        assert!(output.contains("=== Concepts ==="));
        assert!(output.contains("No relationships found."));
        assert!(output.contains("No hierarchy found."));

        let json = Formatter::new(OutputFormat::Json, false)
            .format_graph(&[concept("Root", None, 0)], &[])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["concepts"][0]["name"], "Root");
        assert!(value["hierarchy"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.heading("Concepts"), "=== Concepts ===");
    }
}
