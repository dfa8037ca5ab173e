//! CLI command definitions and argument parsing.

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strata - Build a concept graph from technical documents.
#[derive(Debug, Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. "debug" or "strata_pipeline=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract concepts from a document into the graph
    Process(ProcessArgs),

    /// Print the concepts, relationships and hierarchy in the graph
    Show,

    /// Manage the graph database container
    Db(DbArgs),
}

/// Arguments for the process command.
#[derive(Debug, Parser)]
pub struct ProcessArgs {
    /// Document to process
    pub file: PathBuf,

    /// Override the chunk size threshold (characters)
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

/// Arguments for the db command.
#[derive(Debug, Parser)]
pub struct DbArgs {
    #[command(subcommand)]
    pub action: DbAction,
}

/// Database container actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum DbAction {
    /// Start the container and wait until it is healthy
    Start,
    /// Stop the container
    Stop,
    /// Report whether the container is running
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from(["strata", "process", "doc.md", "--chunk-size", "500"]).unwrap();
        match cli.command {
            Command::Process(args) => {
                assert_eq!(args.file, PathBuf::from("doc.md"));
                assert_eq!(args.chunk_size, Some(500));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_db_action() {
        let cli = Cli::try_parse_from(["strata", "db", "status", "--no-color"]).unwrap();
        assert!(cli.no_color);
        assert!(matches!(
            cli.command,
            Command::Db(DbArgs {
                action: DbAction::Status
            })
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["strata", "show", "--format", "json", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_process_requires_file() {
        assert!(Cli::try_parse_from(["strata", "process"]).is_err());
    }
}
