//! Command implementations.

pub mod db;
pub mod process;
pub mod show;

pub use self::db::execute_db;
pub use self::process::execute_process;
pub use self::show::execute_show;

use crate::config::StoreSettings;
use crate::error::{CliError, Result};
use strata_store::SqliteGraphStore;
use tracing::info;

/// Open the configured SQLite graph.
pub(crate) fn open_sqlite(settings: &StoreSettings) -> Result<SqliteGraphStore> {
    info!(path = %settings.sqlite_path.display(), "opening SQLite graph");
    Ok(SqliteGraphStore::new(&settings.sqlite_path)?)
}

/// Connect to the configured Neo4j graph.
#[cfg(feature = "neo4j")]
pub(crate) fn open_neo4j(settings: &StoreSettings) -> Result<strata_store::Neo4jGraphStore> {
    let password = std::env::var(&settings.neo4j_password_env).map_err(|_| {
        CliError::Config(format!("{} is not set", settings.neo4j_password_env))
    })?;

    let config = strata_store::Neo4jConfig {
        uri: settings.neo4j_uri.clone(),
        user: settings.neo4j_user.clone(),
        password,
    };
    Ok(strata_store::Neo4jGraphStore::connect(config)?)
}

/// Error for a Neo4j backend in a build without it.
#[cfg(not(feature = "neo4j"))]
pub(crate) fn neo4j_unavailable() -> CliError {
    CliError::Config("the neo4j backend requires building with --features neo4j".to_string())
}
