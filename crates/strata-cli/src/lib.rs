//! Strata CLI library.
//!
//! Configuration loading, command execution, database container lifecycle
//! and output formatting for the `strata` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::{Formatter, OutputFormat};
