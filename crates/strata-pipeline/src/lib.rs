//! Strata Pipeline
//!
//! Turns a text document into a concept graph, one chunk at a time.
//!
//! # Overview
//!
//! The document is split into line-aligned chunks. Each chunk is sent to a
//! language model together with a short rendering of the most reliable
//! concepts seen so far. The model's structured reply is validated, parsed
//! into concepts and relationships, and written to a graph store. Concepts
//! are merged by name; relationships are always created.
//!
//! # Architecture
//!
//! ```text
//! Document → ChunkIterator → (chunk, context) → LLM → validate/parse
//!          → GraphWriter → GraphStore
//!                        ↘ ContextWindow (primes the next chunk)
//! ```
//!
//! # Failure model
//!
//! - Extraction, validation and write failures are retried with exponential
//!   backoff; a chunk that still fails is recorded and skipped
//! - A store that stays unreachable through the retry budget aborts the run
//!
//! # Example Usage
//!
//! ```no_run
//! use strata_pipeline::{Pipeline, PipelineConfig};
//! use strata_llm::MockProvider;
//! use strata_store::SqliteGraphStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"analysis": {"concepts": [], "relationships": []}}"#);
//! let store = SqliteGraphStore::in_memory()?;
//!
//! let mut pipeline = Pipeline::new(llm, store, PipelineConfig::default())?;
//! let report = pipeline.run_file("design.md")?;
//!
//! println!("{} of {} chunks written", report.chunks_succeeded, report.chunks_total);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod client;
mod config;
mod context;
mod error;
mod parser;
mod pipeline;
mod prompt;
mod retry;
mod types;
mod validator;
mod writer;


pub use chunking::{ChunkIterator, DEFAULT_CHUNK_SIZE};
pub use client::ExtractionClient;
pub use config::PipelineConfig;
pub use context::{ContextEntry, ContextWindow};
pub use error::{PipelineError, ValidationError};
pub use parser::{decode_response, parse};
pub use pipeline::Pipeline;
pub use prompt::{Prompt, PromptBuilder};
pub use retry::{RecordingSleeper, RetryPolicy, Sleeper, ThreadSleeper};
pub use types::{ChunkFailure, ChunkStage, ChunkState, Extraction, RunReport};
pub use validator::validate;
pub use writer::GraphWriter;
