//! Show command implementation.

use crate::config::{Backend, Config};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use strata_domain::traits::GraphInspect;

/// Execute the show command.
pub fn execute_show(config: &Config, formatter: &Formatter) -> Result<()> {
    let output = match config.store.backend {
        Backend::Sqlite => render_graph(&super::open_sqlite(&config.store)?, formatter)?,
        #[cfg(feature = "neo4j")]
        Backend::Neo4j => render_graph(&super::open_neo4j(&config.store)?, formatter)?,
        #[cfg(not(feature = "neo4j"))]
        Backend::Neo4j => return Err(super::neo4j_unavailable()),
    };

    println!("{}", output);
    Ok(())
}

/// Read the whole graph and format it.
pub fn render_graph<S>(store: &S, formatter: &Formatter) -> Result<String>
where
    S: GraphInspect,
    CliError: From<S::Error>,
{
    let concepts = store.list_concepts()?;
    let relationships = store.list_relationships()?;
    formatter.format_graph(&concepts, &relationships)
}
