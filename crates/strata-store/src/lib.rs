//! Strata Storage Layer
//!
//! Implements the `GraphStore` and `GraphInspect` traits for the concept graph.
//!
//! # Backends
//!
//! - `SqliteGraphStore`: SQLite tables for nodes and edges (always available)
//! - `Neo4jGraphStore`: Neo4j over Bolt (requires the `neo4j` feature)
//!
//! # Examples
//!
//! ```no_run
//! use strata_store::SqliteGraphStore;
//!
//! let store = SqliteGraphStore::new("graph.db").unwrap();
//! // Store is now ready for graph operations
//! ```

#![warn(missing_docs)]

mod sqlite;

#[cfg(feature = "neo4j")]
mod neo4j;

use strata_domain::StoreFailure;
use thiserror::Error;

pub use sqlite::SqliteGraphStore;

#[cfg(feature = "neo4j")]
pub use neo4j::{Neo4jConfig, Neo4jGraphStore};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or the connection broke
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Relationship endpoint does not exist
    #[error("Missing endpoint: {0}")]
    MissingEndpoint(String),

    /// The store refused the write
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error for list and map columns
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreFailure for StoreError {
    fn is_connectivity(&self) -> bool {
        match self {
            StoreError::Connection(_) => true,
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
                    | rusqlite::ErrorCode::SystemIoFailure
            ),
            _ => false,
        }
    }
}
