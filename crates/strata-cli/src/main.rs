//! Strata CLI - Build a concept graph from technical documents.

use clap::Parser;
use strata_cli::{commands, config, Cli, Command, Config, Formatter};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    // Before parsing, so `env` arguments see values from .env
    let env_file = config::load_dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    if let Err(e) = env_file {
        warn!(error = %e, "ignoring .env file");
    }

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr; `--log-level` wins over `RUST_LOG`, which wins over `info`
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> strata_cli::Result<bool> {
    let config = Config::load(cli.config.as_deref())?;
    let formatter = Formatter::new(cli.format, !cli.no_color);

    match cli.command {
        Command::Process(args) => {
            commands::execute_process(args, &config, &formatter)?;
            Ok(true)
        }
        Command::Show => {
            commands::execute_show(&config, &formatter)?;
            Ok(true)
        }
        Command::Db(args) => commands::execute_db(args, &config, &formatter),
    }
}
