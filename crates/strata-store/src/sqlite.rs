//! SQLite-backed concept graph

use crate::StoreError;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strata_domain::traits::{GraphInspect, GraphStore};
use strata_domain::{
    BidirectionalStrength, Classification, Concept, Confidence, Hierarchy, Provenance,
    Relationship, RelationshipMetadata, SourceRef, Temporal,
};
use tracing::debug;

const IN_MEMORY: &str = ":memory:";

const CONCEPT_COLUMNS: &str = "name, concept_type, description, confidence, source_position, \
     source_context, hierarchy_parent, hierarchy_level, version, refs";

const RELATIONSHIP_COLUMNS: &str = "source, target, relationship_type, confidence, \
     forward_strength, backward_strength, first_seen, last_seen, category, directness, \
     strength, source_context, extraction_method, properties";

/// SQLite-based implementation of GraphStore
///
/// Concepts live in a table keyed by name; every created edge is a new row
/// in the relationships table.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. The pipeline is the only writer
/// and owns this store for the length of a run.
pub struct SqliteGraphStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteGraphStore {
    /// Open (or create) a graph database at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use strata_store::SqliteGraphStore;
    ///
    /// let store = SqliteGraphStore::new("graph.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Self::open(&path)?;
        Ok(Self { path, conn })
    }

    /// Open an in-memory graph
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(IN_MEMORY)
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    fn open(path: &Path) -> Result<Connection, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Connection(format!("{}: {}", path.display(), e)))?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(conn)
    }

    fn concept_exists(conn: &Connection, name: &str) -> Result<bool, StoreError> {
        let found = conn
            .query_row("SELECT 1 FROM concepts WHERE name = ?1", params![name], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

/// Wrap a decoding failure the way rusqlite reports column conversion errors
fn conversion_error<E>(column: usize, ty: Type, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(error))
}

fn confidence_at(row: &Row<'_>, column: usize) -> rusqlite::Result<Confidence> {
    let raw: f64 = row.get(column)?;
    Confidence::new(raw).map_err(|e| conversion_error(column, Type::Real, e))
}

fn row_to_concept(row: &Row<'_>) -> rusqlite::Result<Concept> {
    let refs: String = row.get(9)?;
    let references: Vec<String> =
        serde_json::from_str(&refs).map_err(|e| conversion_error(9, Type::Text, e))?;

    Ok(Concept {
        name: row.get(0)?,
        concept_type: row.get(1)?,
        description: row.get(2)?,
        confidence: confidence_at(row, 3)?,
        source: SourceRef {
            position: row.get::<_, i64>(4)? as u64,
            context: row.get(5)?,
        },
        hierarchy: Hierarchy {
            parent: row.get(6)?,
            level: row.get::<_, i64>(7)? as u32,
        },
        version: row.get::<_, i64>(8)? as u64,
        references,
    })
}

fn row_to_relationship(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let props: String = row.get(13)?;
    let properties: BTreeMap<String, String> =
        serde_json::from_str(&props).map_err(|e| conversion_error(13, Type::Text, e))?;

    Ok(Relationship {
        source: row.get(0)?,
        target: row.get(1)?,
        relationship_type: row.get(2)?,
        metadata: RelationshipMetadata {
            confidence: confidence_at(row, 3)?,
            bidirectional_strength: BidirectionalStrength {
                forward: confidence_at(row, 4)?,
                backward: confidence_at(row, 5)?,
            },
            temporal: Temporal {
                first_seen: row.get(6)?,
                last_seen: row.get(7)?,
            },
            classification: Classification {
                category: row.get(8)?,
                directness: row.get(9)?,
                strength: row.get(10)?,
            },
            provenance: Provenance {
                source_context: row.get(11)?,
                extraction_method: row.get(12)?,
            },
        },
        properties,
    })
}

impl GraphStore for SqliteGraphStore {
    type Error = StoreError;

    fn upsert_concept_by_name(&mut self, concept: &Concept) -> Result<(), Self::Error> {
        let refs = serde_json::to_string(&concept.references)?;

        // Last write wins on every mutable attribute, version included
        self.conn.execute(
            &format!(
                "INSERT INTO concepts ({CONCEPT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(name) DO UPDATE SET
                    concept_type = excluded.concept_type,
                    description = excluded.description,
                    confidence = excluded.confidence,
                    source_position = excluded.source_position,
                    source_context = excluded.source_context,
                    hierarchy_parent = excluded.hierarchy_parent,
                    hierarchy_level = excluded.hierarchy_level,
                    version = excluded.version,
                    refs = excluded.refs"
            ),
            params![
                &concept.name,
                &concept.concept_type,
                &concept.description,
                concept.confidence.value(),
                concept.source.position as i64,
                &concept.source.context,
                &concept.hierarchy.parent,
                concept.hierarchy.level as i64,
                concept.version as i64,
                &refs,
            ],
        )?;

        debug!(name = %concept.name, "upserted concept");
        Ok(())
    }

    fn match_concept_by_name(&self, name: &str) -> Result<Option<Concept>, Self::Error> {
        let concept = self
            .conn
            .query_row(
                &format!("SELECT {CONCEPT_COLUMNS} FROM concepts WHERE name = ?1"),
                params![name],
                row_to_concept,
            )
            .optional()?;
        Ok(concept)
    }

    fn create_directed_edge(&mut self, relationship: &Relationship) -> Result<(), Self::Error> {
        let properties = serde_json::to_string(&relationship.properties)?;
        let metadata = &relationship.metadata;

        let tx = self.conn.transaction()?;

        for (role, name) in [("source", &relationship.source), ("target", &relationship.target)] {
            if !Self::concept_exists(&tx, name)? {
                return Err(StoreError::MissingEndpoint(format!(
                    "{} concept '{}' does not exist",
                    role, name
                )));
            }
        }

        tx.execute(
            &format!(
                "INSERT INTO relationships ({RELATIONSHIP_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                &relationship.source,
                &relationship.target,
                &relationship.relationship_type,
                metadata.confidence.value(),
                metadata.bidirectional_strength.forward.value(),
                metadata.bidirectional_strength.backward.value(),
                &metadata.temporal.first_seen,
                &metadata.temporal.last_seen,
                &metadata.classification.category,
                &metadata.classification.directness,
                &metadata.classification.strength,
                &metadata.provenance.source_context,
                &metadata.provenance.extraction_method,
                &properties,
            ],
        )?;
        tx.commit()?;

        debug!(
            source = %relationship.source,
            target = %relationship.target,
            "created relationship"
        );
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), Self::Error> {
        // Reopening ":memory:" would hand back an empty database
        if self.is_in_memory() {
            return Ok(());
        }
        self.conn = Self::open(&self.path)?;
        debug!(path = %self.path.display(), "reopened graph database");
        Ok(())
    }
}

impl GraphInspect for SqliteGraphStore {
    type Error = StoreError;

    fn list_concepts(&self) -> Result<Vec<Concept>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CONCEPT_COLUMNS} FROM concepts ORDER BY name"))?;
        let concepts = stmt
            .query_map([], row_to_concept)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(concepts)
    }

    fn list_relationships(&self) -> Result<Vec<Relationship>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships ORDER BY id"
        ))?;
        let relationships = stmt
            .query_map([], row_to_relationship)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(relationships)
    }
}
