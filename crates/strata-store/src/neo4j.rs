//! Neo4j-backed concept graph
//!
//! Concepts are `(:Concept {name})` nodes merged by name; relationships are
//! `[:RELATES_TO]` edges that are always created, never merged.

use crate::StoreError;
use neo4rs::{query, Graph, Query, Row};
use std::collections::{BTreeMap, HashMap};
use strata_domain::traits::{GraphInspect, GraphStore};
use strata_domain::{
    BidirectionalStrength, Classification, Concept, Confidence, Hierarchy, Provenance,
    Relationship, RelationshipMetadata, SourceRef, Temporal,
};
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Connection settings for [`Neo4jGraphStore`]
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// Bolt URI, e.g. `bolt://localhost:7687`
    pub uri: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
}

/// Neo4j implementation of GraphStore
///
/// The driver is async; this store owns a runtime and blocks on each call so
/// the pipeline stays strictly sequential.
pub struct Neo4jGraphStore {
    config: Neo4jConfig,
    runtime: Runtime,
    graph: Graph,
}

const UPSERT_CONCEPT: &str = "MERGE (c:Concept {name: $name})
    SET c.type = $type,
        c.description = $description,
        c.confidence = $confidence,
        c.source_position = $source_position,
        c.source_context = $source_context,
        c.hierarchy_parent = $hierarchy_parent,
        c.hierarchy_level = $hierarchy_level,
        c.version = $version,
        c.references = $references";

const MATCH_CONCEPT: &str = "MATCH (c:Concept {name: $name})
    RETURN c.name AS name, c.type AS type, c.description AS description,
           c.confidence AS confidence, c.source_position AS source_position,
           c.source_context AS source_context, c.hierarchy_parent AS hierarchy_parent,
           c.hierarchy_level AS hierarchy_level, c.version AS version,
           c.references AS references";

const LIST_CONCEPTS: &str = "MATCH (c:Concept)
    RETURN c.name AS name, c.type AS type, c.description AS description,
           c.confidence AS confidence, c.source_position AS source_position,
           c.source_context AS source_context, c.hierarchy_parent AS hierarchy_parent,
           c.hierarchy_level AS hierarchy_level, c.version AS version,
           c.references AS references
    ORDER BY c.name";

// Endpoint presence is checked in the same statement; zero rows means one
// of the MATCH clauses found nothing
const CREATE_RELATIONSHIP: &str = "MATCH (source:Concept {name: $source})
    MATCH (target:Concept {name: $target})
    CREATE (source)-[r:RELATES_TO {
        type: $type,
        confidence: $confidence,
        forward_strength: $forward_strength,
        backward_strength: $backward_strength,
        first_seen: $first_seen,
        last_seen: $last_seen,
        category: $category,
        directness: $directness,
        strength: $strength,
        source_context: $source_context,
        extraction_method: $extraction_method
    }]->(target)
    SET r += $properties
    RETURN count(r) AS created";

const LIST_RELATIONSHIPS: &str = "MATCH (s:Concept)-[r:RELATES_TO]->(t:Concept)
    RETURN s.name AS source, t.name AS target, properties(r) AS props
    ORDER BY id(r)";

/// Metadata keys stored on the edge next to the open properties
const EDGE_METADATA_KEYS: [&str; 11] = [
    "type",
    "confidence",
    "forward_strength",
    "backward_strength",
    "first_seen",
    "last_seen",
    "category",
    "directness",
    "strength",
    "source_context",
    "extraction_method",
];

fn classify(error: neo4rs::Error) -> StoreError {
    match error {
        neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
            StoreError::Connection(error.to_string())
        }
        other => StoreError::Rejected(other.to_string()),
    }
}

fn decode<'row, T>(row: &'row Row, key: &str) -> Result<T, StoreError>
where
    T: serde::Deserialize<'row>,
{
    row.get::<T>(key)
        .map_err(|e| StoreError::InvalidData(format!("column '{}': {}", key, e)))
}

fn confidence(value: f64) -> Result<Confidence, StoreError> {
    Confidence::new(value).map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn row_to_concept(row: &Row) -> Result<Concept, StoreError> {
    Ok(Concept {
        name: decode(row, "name")?,
        concept_type: decode(row, "type")?,
        description: decode(row, "description")?,
        confidence: confidence(decode(row, "confidence")?)?,
        source: SourceRef {
            position: decode::<i64>(row, "source_position")? as u64,
            context: decode(row, "source_context")?,
        },
        hierarchy: Hierarchy {
            parent: decode(row, "hierarchy_parent")?,
            level: decode::<i64>(row, "hierarchy_level")? as u32,
        },
        version: decode::<i64>(row, "version")? as u64,
        references: decode(row, "references")?,
    })
}

fn row_to_relationship(row: &Row) -> Result<Relationship, StoreError> {
    let props: HashMap<String, serde_json::Value> = decode(row, "props")?;
    let text = |key: &str| -> Result<String, StoreError> {
        props
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidData(format!("edge property '{}'", key)))
    };
    let number = |key: &str| -> Result<Confidence, StoreError> {
        let value = props
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| StoreError::InvalidData(format!("edge property '{}'", key)))?;
        confidence(value)
    };

    let properties: BTreeMap<String, String> = props
        .iter()
        .filter(|(key, _)| !EDGE_METADATA_KEYS.contains(&key.as_str()))
        .map(|(key, value)| {
            let value = value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());
            (key.clone(), value)
        })
        .collect();

    Ok(Relationship {
        source: decode(row, "source")?,
        target: decode(row, "target")?,
        relationship_type: text("type")?,
        metadata: RelationshipMetadata {
            confidence: number("confidence")?,
            bidirectional_strength: BidirectionalStrength {
                forward: number("forward_strength")?,
                backward: number("backward_strength")?,
            },
            temporal: Temporal {
                first_seen: text("first_seen")?,
                last_seen: text("last_seen")?,
            },
            classification: Classification {
                category: text("category")?,
                directness: text("directness")?,
                strength: text("strength")?,
            },
            provenance: Provenance {
                source_context: text("source_context")?,
                extraction_method: text("extraction_method")?,
            },
        },
        properties,
    })
}

impl Neo4jGraphStore {
    /// Connect to Neo4j
    pub fn connect(config: Neo4jConfig) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to start runtime: {}", e)))?;
        let graph = Self::open(&runtime, &config)?;
        info!(uri = %config.uri, "connected to Neo4j");
        Ok(Self {
            config,
            runtime,
            graph,
        })
    }

    fn open(runtime: &Runtime, config: &Neo4jConfig) -> Result<Graph, StoreError> {
        runtime
            .block_on(Graph::new(
                config.uri.as_str(),
                config.user.as_str(),
                config.password.as_str(),
            ))
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    fn fetch_all(&self, q: Query) -> Result<Vec<Row>, StoreError> {
        self.runtime.block_on(async {
            let mut stream = self.graph.execute(q).await.map_err(classify)?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await.map_err(classify)? {
                rows.push(row);
            }
            Ok(rows)
        })
    }
}

impl GraphStore for Neo4jGraphStore {
    type Error = StoreError;

    fn upsert_concept_by_name(&mut self, concept: &Concept) -> Result<(), Self::Error> {
        let q = query(UPSERT_CONCEPT)
            .param("name", concept.name.as_str())
            .param("type", concept.concept_type.as_str())
            .param("description", concept.description.as_str())
            .param("confidence", concept.confidence.value())
            .param("source_position", concept.source.position as i64)
            .param("source_context", concept.source.context.as_str())
            .param("hierarchy_parent", concept.hierarchy.parent.clone())
            .param("hierarchy_level", concept.hierarchy.level as i64)
            .param("version", concept.version as i64)
            .param("references", concept.references.clone());

        self.runtime.block_on(self.graph.run(q)).map_err(classify)?;
        debug!(name = %concept.name, "merged concept node");
        Ok(())
    }

    fn match_concept_by_name(&self, name: &str) -> Result<Option<Concept>, Self::Error> {
        let rows = self.fetch_all(query(MATCH_CONCEPT).param("name", name))?;
        rows.first().map(row_to_concept).transpose()
    }

    fn create_directed_edge(&mut self, relationship: &Relationship) -> Result<(), Self::Error> {
        let metadata = &relationship.metadata;
        let properties: HashMap<String, String> = relationship
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let q = query(CREATE_RELATIONSHIP)
            .param("source", relationship.source.as_str())
            .param("target", relationship.target.as_str())
            .param("type", relationship.relationship_type.as_str())
            .param("confidence", metadata.confidence.value())
            .param("forward_strength", metadata.bidirectional_strength.forward.value())
            .param("backward_strength", metadata.bidirectional_strength.backward.value())
            .param("first_seen", metadata.temporal.first_seen.as_str())
            .param("last_seen", metadata.temporal.last_seen.as_str())
            .param("category", metadata.classification.category.as_str())
            .param("directness", metadata.classification.directness.as_str())
            .param("strength", metadata.classification.strength.as_str())
            .param("source_context", metadata.provenance.source_context.as_str())
            .param("extraction_method", metadata.provenance.extraction_method.as_str())
            .param("properties", properties);

        let rows = self.fetch_all(q)?;
        let created = match rows.first() {
            Some(row) => decode::<i64>(row, "created")?,
            None => 0,
        };
        if created == 0 {
            return Err(StoreError::MissingEndpoint(format!(
                "'{}' or '{}' does not exist",
                relationship.source, relationship.target
            )));
        }
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), Self::Error> {
        self.graph = Self::open(&self.runtime, &self.config)?;
        debug!(uri = %self.config.uri, "reconnected to Neo4j");
        Ok(())
    }
}

impl GraphInspect for Neo4jGraphStore {
    type Error = StoreError;

    fn list_concepts(&self) -> Result<Vec<Concept>, Self::Error> {
        self.fetch_all(query(LIST_CONCEPTS))?
            .iter()
            .map(row_to_concept)
            .collect()
    }

    fn list_relationships(&self) -> Result<Vec<Relationship>, Self::Error> {
        self.fetch_all(query(LIST_RELATIONSHIPS))?
            .iter()
            .map(row_to_relationship)
            .collect()
    }
}
