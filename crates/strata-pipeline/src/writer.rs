//! Retried graph writes

use crate::error::PipelineError;
use crate::retry::{RetryPolicy, Sleeper};
use std::sync::Arc;
use strata_domain::traits::GraphStore;
use strata_domain::{Concept, Relationship, StoreFailure};
use tracing::debug;

/// Writes concepts and relationships, one retried store call each
///
/// Every retry first asks the store for a fresh connection. Once the budget
/// is spent, connectivity failures become [`PipelineError::Connectivity`] and
/// everything else [`PipelineError::GraphWrite`].
pub struct GraphWriter<S> {
    store: S,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<S: GraphStore> GraphWriter<S> {
    /// Create a writer over `store`
    pub fn new(store: S, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            store,
            policy,
            sleeper,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the underlying store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Merge a concept by name, overwriting its attributes
    pub fn upsert_concept(&mut self, concept: &Concept) -> Result<(), PipelineError> {
        debug!(name = %concept.name, version = concept.version, "writing concept");
        self.with_retry("upsert_concept", |store| store.upsert_concept_by_name(concept))
    }

    /// Create a new edge between two existing concepts
    pub fn create_relationship(&mut self, relationship: &Relationship) -> Result<(), PipelineError> {
        debug!(
            source = %relationship.source,
            target = %relationship.target,
            relationship_type = %relationship.relationship_type,
            "writing relationship"
        );
        self.with_retry("create_relationship", |store| {
            store.create_directed_edge(relationship)
        })
    }

    fn with_retry<F>(&mut self, label: &str, mut operation: F) -> Result<(), PipelineError>
    where
        F: FnMut(&mut S) -> Result<(), S::Error>,
    {
        let policy = self.policy;
        let sleeper = Arc::clone(&self.sleeper);
        let store = &mut self.store;

        policy
            .run(sleeper.as_ref(), label, |attempt| {
                if attempt > 0 {
                    // A failed reconnect uses up this attempt
                    store.reconnect()?;
                }
                operation(store)
            })
            .map_err(|e| {
                if e.is_connectivity() {
                    PipelineError::Connectivity(e.to_string())
                } else {
                    PipelineError::GraphWrite(e.to_string())
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RecordingSleeper;
    use std::time::Duration;
    use strata_domain::traits::GraphInspect;
    use strata_domain::{Confidence, Hierarchy, SourceRef};
    use strata_store::SqliteGraphStore;

    fn concept(name: &str) -> Concept {
        Concept {
            name: name.to_string(),
            concept_type: "term".to_string(),
            description: String::new(),
            confidence: Confidence::new(0.8).unwrap(),
            source: SourceRef {
                position: 0,
                context: String::new(),
            },
            hierarchy: Hierarchy {
                parent: None,
                level: 0,
            },
            version: 1,
            references: Vec::new(),
        }
    }

    fn writer(sleeper: &RecordingSleeper) -> GraphWriter<SqliteGraphStore> {
        GraphWriter::new(
            SqliteGraphStore::in_memory().unwrap(),
            RetryPolicy::new(3, Duration::from_millis(100)),
            Arc::new(sleeper.clone()),
        )
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let sleeper = RecordingSleeper::new();
        let mut writer = writer(&sleeper);

        writer.upsert_concept(&concept("A")).unwrap();
        writer.upsert_concept(&concept("A")).unwrap();

        assert_eq!(writer.store().list_concepts().unwrap().len(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn test_rejected_write_is_retried_then_graph_write_error() {
        let sleeper = RecordingSleeper::new();
        let mut writer = writer(&sleeper);
        writer.upsert_concept(&concept("A")).unwrap();

        let mut rel = crate::tests::relationship("A", "Missing");
        rel.properties.clear();
        let err = writer.create_relationship(&rel).unwrap_err();

        assert!(matches!(err, PipelineError::GraphWrite(_)), "got {:?}", err);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
        assert!(writer.into_store().list_relationships().unwrap().is_empty());
    }
}
