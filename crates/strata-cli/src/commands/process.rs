//! Process command implementation.

use crate::cli::ProcessArgs;
use crate::config::{Backend, Config, LlmSettings};
use crate::error::Result;
use crate::output::Formatter;
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;
use strata_domain::traits::{GraphStore, LlmProvider};
use strata_llm::ChatProvider;
use strata_pipeline::{Pipeline, PipelineConfig, RunReport};
use tracing::warn;

/// Execute the process command.
pub fn execute_process(args: ProcessArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut pipeline_config = config.pipeline.clone();
    if let Some(chunk_size) = args.chunk_size {
        pipeline_config.chunk_size = chunk_size;
    }

    let provider = build_provider(&config.llm)?;

    match config.store.backend {
        Backend::Sqlite => {
            let store = super::open_sqlite(&config.store)?;
            process_document(provider, store, pipeline_config, &args.file, formatter)?;
        }
        #[cfg(feature = "neo4j")]
        Backend::Neo4j => {
            let store = super::open_neo4j(&config.store)?;
            process_document(provider, store, pipeline_config, &args.file, formatter)?;
        }
        #[cfg(not(feature = "neo4j"))]
        Backend::Neo4j => return Err(super::neo4j_unavailable()),
    }

    Ok(())
}

/// Build the chat provider from settings and the environment.
pub fn build_provider(settings: &LlmSettings) -> Result<ChatProvider> {
    let mut provider = ChatProvider::with_timeout(
        settings.api_base_url.clone(),
        settings.model.clone(),
        Duration::from_secs(settings.timeout_secs),
    )?;

    match std::env::var(&settings.api_key_env) {
        Ok(key) => provider = provider.with_api_key(key),
        Err(_) => warn!(variable = %settings.api_key_env, "no API key set, sending unauthenticated requests"),
    }
    if let Some(temperature) = settings.temperature {
        provider = provider.with_temperature(temperature);
    }

    Ok(provider)
}

/// Run one document through a pipeline and print the report.
pub fn process_document<L, S>(
    provider: L,
    store: S,
    config: PipelineConfig,
    path: &Path,
    formatter: &Formatter,
) -> Result<RunReport>
where
    L: LlmProvider,
    L::Error: Display,
    S: GraphStore,
{
    let mut pipeline = Pipeline::new(provider, store, config)?;
    let report = pipeline.run_file(path)?;

    println!("{}", formatter.format_report(&report)?);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::output::OutputFormat;
    use strata_domain::traits::GraphInspect;
    use strata_llm::MockProvider;
    use strata_pipeline::PipelineError;
    use strata_store::SqliteGraphStore;

    const REPLY: &str = r#"{"analysis": {"concepts": [{"name": "Parser", "type": "component",
        "description": "Reads tokens", "confidence": 0.9,
        "source": {"position": 0, "context": "parser"},
        "hierarchy": {"parent": "Compiler", "level": 1}, "version": 1, "references": []}],
        "relationships": []}}"#;

    #[test]
    fn test_process_document_writes_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.md");
        std::fs::write(&doc, "The parser reads tokens.\n").unwrap();
        let db = dir.path().join("graph.db");

        let formatter = Formatter::new(OutputFormat::Table, false);
        let report = process_document(
            MockProvider::new(REPLY),
            SqliteGraphStore::new(&db).unwrap(),
            PipelineConfig::default(),
            &doc,
            &formatter,
        )
        .unwrap();

        assert_eq!(report.chunks_succeeded, 1);
        let store = SqliteGraphStore::new(&db).unwrap();
        assert_eq!(store.list_concepts().unwrap()[0].name, "Parser");
    }

    #[test]
    fn test_missing_document_is_reported() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let result = process_document(
            MockProvider::new(REPLY),
            SqliteGraphStore::in_memory().unwrap(),
            PipelineConfig::default(),
            Path::new("/no/such/doc.md"),
            &formatter,
        );
        assert!(matches!(result, Err(CliError::Pipeline(PipelineError::Io(_)))));
    }

    #[test]
    fn test_build_provider_from_defaults() {
        let provider = build_provider(&LlmSettings::default()).unwrap();
        assert_eq!(provider.model_name(), "deepseek-chat");
    }
}
