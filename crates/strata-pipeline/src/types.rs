//! Records produced while processing a document

use crate::error::PipelineError;
use std::fmt;
use strata_domain::{Concept, Relationship};

/// Typed result of one successful extraction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    /// Concepts in response order
    pub concepts: Vec<Concept>,
    /// Relationships in response order
    pub relationships: Vec<Relationship>,
}

/// Stage at which a chunk was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStage {
    /// The model call failed
    Extracting,
    /// The model replied with a malformed response
    Validating,
    /// A graph write failed
    Writing,
}

impl fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChunkStage::Extracting => "extracting",
            ChunkStage::Validating => "validating",
            ChunkStage::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// Per-chunk state machine
///
/// `Extracting → Validating → Writing → ContextUpdate → Done`, with
/// `Failed` reachable from the first three once retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Waiting on the model
    Extracting,
    /// Checking the model's response
    Validating,
    /// Writing concepts and relationships
    Writing,
    /// Feeding the chunk's concepts into the context window
    ContextUpdate,
    /// Finished successfully
    Done,
    /// Abandoned at the given stage
    Failed(ChunkStage),
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkState::Extracting => f.write_str("extracting"),
            ChunkState::Validating => f.write_str("validating"),
            ChunkState::Writing => f.write_str("writing"),
            ChunkState::ContextUpdate => f.write_str("context_update"),
            ChunkState::Done => f.write_str("done"),
            ChunkState::Failed(stage) => write!(f, "failed({})", stage),
        }
    }
}

/// A chunk that was abandoned
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    /// 0-based chunk index
    pub index: usize,
    /// Where it failed
    pub stage: ChunkStage,
    /// The last error seen
    pub error: PipelineError,
}

/// Outcome of a document run that was not aborted
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunReport {
    /// Chunks read from the document
    pub chunks_total: usize,
    /// Chunks that reached `Done`
    pub chunks_succeeded: usize,
    /// Concept upserts that succeeded, including those of failed chunks
    pub concepts_written: usize,
    /// Relationships created, including those of failed chunks
    pub relationships_written: usize,
    /// Abandoned chunks, in document order
    pub failures: Vec<ChunkFailure>,
}

impl RunReport {
    /// True when every chunk succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
