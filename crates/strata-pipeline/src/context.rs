//! Rolling context of high-confidence concepts
//!
//! The window primes each extraction call with concepts from earlier chunks
//! so the model names things consistently across the document.

use strata_domain::{Concept, Confidence, Hierarchy};

/// Default maximum number of retained entries
pub const DEFAULT_MAX_SIZE: usize = 15;

/// Default admission threshold
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

/// Default number of entries rendered per request
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// The part of a concept kept in the window
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    /// Concept name
    pub name: String,
    /// Concept type
    pub concept_type: String,
    /// Concept description
    pub description: String,
    /// Hierarchical placement
    pub hierarchy: Hierarchy,
    /// Extraction confidence
    pub confidence: Confidence,
}

impl From<&Concept> for ContextEntry {
    fn from(concept: &Concept) -> Self {
        Self {
            name: concept.name.clone(),
            concept_type: concept.concept_type.clone(),
            description: concept.description.clone(),
            hierarchy: concept.hierarchy.clone(),
            confidence: concept.confidence,
        }
    }
}

/// Bounded, confidence-ranked memory of extracted concepts
///
/// Admission is by threshold; eviction keeps the `max_size` most confident
/// entries, not the most recent ones. Lives for one document run.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    entries: Vec<ContextEntry>,
    max_size: usize,
    min_confidence: f64,
}

impl ContextWindow {
    /// Create an empty window
    pub fn new(max_size: usize, min_confidence: f64) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
            min_confidence,
        }
    }

    /// Render the last `window_size` entries, in their current order
    ///
    /// One `"<name> (<type>): <description>"` line per entry, followed by a
    /// `"Parent: <parent>"` line when the entry has a parent.
    pub fn render(&self, window_size: usize) -> String {
        let start = self.entries.len().saturating_sub(window_size);
        let mut lines = Vec::new();

        for entry in &self.entries[start..] {
            lines.push(format!(
                "{} ({}): {}",
                entry.name, entry.concept_type, entry.description
            ));
            if let Some(parent) = &entry.hierarchy.parent {
                lines.push(format!("Parent: {}", parent));
            }
        }

        lines.join("\n")
    }

    /// Admit every concept at or above the threshold, then trim to capacity
    ///
    /// When over capacity the whole window is re-sorted by confidence
    /// (descending, stable) and truncated.
    pub fn update(&mut self, concepts: &[Concept]) {
        self.entries.extend(
            concepts
                .iter()
                .filter(|c| c.confidence.value() >= self.min_confidence)
                .map(ContextEntry::from),
        );

        if self.entries.len() > self.max_size {
            self.entries.sort_by(|a, b| b.confidence.cmp(&a.confidence));
            self.entries.truncate(self.max_size);
        }
    }

    /// Current entries in window order
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_MIN_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_domain::SourceRef;

    fn concept(name: &str, confidence: f64, parent: Option<&str>) -> Concept {
        Concept {
            name: name.to_string(),
            concept_type: "term".to_string(),
            description: format!("about {}", name),
            confidence: Confidence::new(confidence).unwrap(),
            source: SourceRef {
                position: 0,
                context: String::new(),
            },
            hierarchy: Hierarchy {
                parent: parent.map(str::to_string),
                level: 0,
            },
            version: 1,
            references: Vec::new(),
        }
    }

    fn names(window: &ContextWindow) -> Vec<&str> {
        window.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_empty_window_renders_empty_string() {
        assert_eq!(ContextWindow::default().render(DEFAULT_WINDOW_SIZE), "");
    }

    #[test]
    fn test_render_format_with_parent() {
        let mut window = ContextWindow::default();
        window.update(&[concept("Tokio", 0.9, Some("Rust")), concept("Serde", 0.8, None)]);

        assert_eq!(
            window.render(5),
            "Tokio (term): about Tokio\nParent: Rust\nSerde (term): about Serde"
        );
    }

    #[test]
    fn test_render_takes_last_entries() {
        let mut window = ContextWindow::default();
        window.update(&[
            concept("a", 0.9, None),
            concept("b", 0.9, None),
            concept("c", 0.9, None),
        ]);

        assert_eq!(window.render(2), "b (term): about b\nc (term): about c");
        assert_eq!(window.render(0), "");
    }

    #[test]
    fn test_low_confidence_is_not_admitted() {
        let mut window = ContextWindow::default();
        window.update(&[concept("weak", 0.69, None), concept("edge", 0.7, None)]);

        assert_eq!(names(&window), vec!["edge"]);
    }

    #[test]
    fn test_under_capacity_keeps_insertion_order() {
        let mut window = ContextWindow::new(3, 0.0);
        window.update(&[concept("low", 0.1, None), concept("high", 0.9, None)]);

        assert_eq!(names(&window), vec!["low", "high"]);
    }

    #[test]
    fn test_eviction_is_by_confidence_not_recency() {
        let mut window = ContextWindow::new(2, 0.7);
        window.update(&[concept("early-strong", 0.95, None), concept("early-weak", 0.71, None)]);
        window.update(&[concept("late", 0.8, None)]);

        // The most recent entry survives only because it beats early-weak
        assert_eq!(names(&window), vec!["early-strong", "late"]);

        window.update(&[concept("later-weak", 0.75, None)]);
        assert_eq!(names(&window), vec!["early-strong", "late"]);
    }

    #[test]
    fn test_ties_keep_pre_sort_order() {
        let mut window = ContextWindow::new(2, 0.0);
        window.update(&[
            concept("first", 0.8, None),
            concept("second", 0.8, None),
            concept("third", 0.8, None),
        ]);

        assert_eq!(names(&window), vec!["first", "second"]);
    }

    proptest! {
        #[test]
        fn prop_window_holds_top_k_admitted(
            batches in proptest::collection::vec(
                proptest::collection::vec(0.0f64..=1.0, 0..8),
                0..10,
            ),
            max_size in 1usize..10,
        ) {
            let min_confidence = 0.5;
            let mut window = ContextWindow::new(max_size, min_confidence);
            let mut admitted = Vec::new();

            for (b, batch) in batches.iter().enumerate() {
                let concepts: Vec<Concept> = batch
                    .iter()
                    .enumerate()
                    .map(|(i, c)| concept(&format!("c{}-{}", b, i), *c, None))
                    .collect();
                admitted.extend(batch.iter().copied().filter(|c| *c >= min_confidence));
                window.update(&concepts);
            }

            admitted.sort_by(|a, b| b.total_cmp(a));
            admitted.truncate(max_size);

            let mut kept: Vec<f64> = window.entries().iter().map(|e| e.confidence.value()).collect();
            kept.sort_by(|a, b| b.total_cmp(a));

            prop_assert_eq!(kept, admitted);
            prop_assert!(window.entries().iter().all(|e| e.confidence.value() >= min_confidence));
        }
    }
}
