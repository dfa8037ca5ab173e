//! Per-chunk orchestration

use crate::chunking::ChunkIterator;
use crate::client::ExtractionClient;
use crate::config::PipelineConfig;
use crate::context::ContextWindow;
use crate::error::PipelineError;
use crate::parser::decode_response;
use crate::retry::{Sleeper, ThreadSleeper};
use crate::types::{ChunkFailure, ChunkStage, ChunkState, RunReport};
use crate::writer::GraphWriter;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use strata_domain::traits::{GraphStore, LlmProvider};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Drives a document through chunking, extraction and graph writes
///
/// Chunks are processed strictly in order, one at a time. A chunk that fails
/// after its retries is recorded in the [`RunReport`] and skipped; only a
/// store that stays unreachable aborts the run.
pub struct Pipeline<L, S> {
    client: ExtractionClient<L>,
    writer: GraphWriter<S>,
    config: PipelineConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl<L, S> Pipeline<L, S>
where
    L: LlmProvider,
    L::Error: Display,
    S: GraphStore,
{
    /// Create a pipeline that sleeps on the current thread between retries
    pub fn new(provider: L, store: S, config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_sleeper(provider, store, config, Arc::new(ThreadSleeper))
    }

    /// Create a pipeline with a custom backoff sleeper
    pub fn with_sleeper(
        provider: L,
        store: S,
        config: PipelineConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let writer = GraphWriter::new(store, config.store_policy(), Arc::clone(&sleeper));
        Ok(Self {
            client: ExtractionClient::new(provider),
            writer,
            config,
            sleeper,
        })
    }

    /// The graph store being written to
    pub fn store(&self) -> &S {
        self.writer.store()
    }

    /// Give back the graph store
    pub fn into_store(self) -> S {
        self.writer.into_store()
    }

    /// Process the document at `path`
    pub fn run_file<P: AsRef<Path>>(&mut self, path: P) -> Result<RunReport, PipelineError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PipelineError::Io(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "processing document");
        self.run(BufReader::new(file))
    }

    /// Process a document read from `reader`
    ///
    /// The context window starts empty and lives only for this run.
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::now_v7();
        let span = info_span!("run", %run_id, model = self.client.model_name());
        let _guard = span.enter();

        let mut context =
            ContextWindow::new(self.config.context_max_size, self.config.context_min_confidence);
        let mut report = RunReport::default();

        for (index, chunk) in ChunkIterator::new(reader, self.config.chunk_size).enumerate() {
            let chunk = chunk?;
            report.chunks_total += 1;

            match self.process_chunk(index, &chunk, &mut context, &mut report) {
                Ok(()) => report.chunks_succeeded += 1,
                Err(failure) => {
                    if let PipelineError::Connectivity(_) = failure.error {
                        for earlier in &report.failures {
                            warn!(
                                chunk = earlier.index,
                                stage = %earlier.stage,
                                error = %earlier.error,
                                "chunk failed before abort"
                            );
                        }
                        error!(
                            chunk = index,
                            succeeded = report.chunks_succeeded,
                            failed = report.failures.len(),
                            error = %failure.error,
                            "graph store unreachable, aborting run"
                        );
                        return Err(failure.error);
                    }
                    warn!(
                        chunk = index,
                        state = %ChunkState::Failed(failure.stage),
                        error = %failure.error,
                        "chunk abandoned"
                    );
                    report.failures.push(failure);
                }
            }
        }

        info!(
            chunks = report.chunks_total,
            succeeded = report.chunks_succeeded,
            failed = report.failures.len(),
            concepts = report.concepts_written,
            relationships = report.relationships_written,
            context_entries = context.len(),
            "run finished"
        );
        Ok(report)
    }

    fn process_chunk(
        &mut self,
        index: usize,
        chunk: &str,
        context: &mut ContextWindow,
        report: &mut RunReport,
    ) -> Result<(), ChunkFailure> {
        let rendered = context.render(self.config.context_window_size);
        let fail = |stage, error| ChunkFailure {
            index,
            stage,
            error,
        };

        // The stage of the last attempt decides where a failed chunk stopped
        let mut stage = ChunkStage::Extracting;
        let client = &self.client;
        let attempt = self
            .config
            .extraction_policy()
            .run(&*self.sleeper, "extract", |_| {
                stage = ChunkStage::Extracting;
                debug!(chunk = index, state = %ChunkState::Extracting, "chunk state");
                let raw = client.extract(chunk, &rendered)?;

                stage = ChunkStage::Validating;
                debug!(chunk = index, state = %ChunkState::Validating, "chunk state");
                decode_response(&raw)
            });
        let extraction = match attempt {
            Ok(extraction) => extraction,
            Err(error) => return Err(fail(stage, error)),
        };

        debug!(
            chunk = index,
            state = %ChunkState::Writing,
            concepts = extraction.concepts.len(),
            relationships = extraction.relationships.len(),
            "chunk state"
        );
        // Concepts first, so relationship endpoints from this chunk exist
        for concept in &extraction.concepts {
            self.writer
                .upsert_concept(concept)
                .map_err(|e| fail(ChunkStage::Writing, e))?;
            report.concepts_written += 1;
        }
        for relationship in &extraction.relationships {
            self.writer
                .create_relationship(relationship)
                .map_err(|e| fail(ChunkStage::Writing, e))?;
            report.relationships_written += 1;
        }

        debug!(chunk = index, state = %ChunkState::ContextUpdate, "chunk state");
        context.update(&extraction.concepts);

        info!(
            chunk = index,
            state = %ChunkState::Done,
            concepts = extraction.concepts.len(),
            relationships = extraction.relationships.len(),
            "chunk processed"
        );
        Ok(())
    }
}
