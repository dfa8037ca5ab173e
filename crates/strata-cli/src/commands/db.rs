//! Database container commands.

use crate::cli::{DbAction, DbArgs};
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::{CommandRunner, Lifecycle, StartOutcome, SystemRunner};
use crate::output::Formatter;
use std::sync::Arc;
use strata_pipeline::ThreadSleeper;

/// Execute a db command. Returns whether it succeeded.
pub fn execute_db(args: DbArgs, config: &Config, formatter: &Formatter) -> Result<bool> {
    let lifecycle = Lifecycle::new(SystemRunner, &config.lifecycle, Arc::new(ThreadSleeper));
    run_action(args.action, &lifecycle, formatter)
}

/// Run one lifecycle action and print its outcome.
pub fn run_action<R: CommandRunner>(
    action: DbAction,
    lifecycle: &Lifecycle<'_, R>,
    formatter: &Formatter,
) -> Result<bool> {
    match action {
        DbAction::Start => match lifecycle.start()? {
            StartOutcome::AlreadyRunning => {
                println!("{}", formatter.info("Database container is already running"));
                Ok(true)
            }
            StartOutcome::Healthy => {
                println!("{}", formatter.success("Database is ready"));
                Ok(true)
            }
            StartOutcome::TimedOut => {
                println!("{}", formatter.error("Timed out waiting for the database to become healthy"));
                Ok(false)
            }
        },
        DbAction::Stop => {
            lifecycle.stop()?;
            println!("{}", formatter.success("Database container stopped"));
            Ok(true)
        }
        DbAction::Status => {
            let running = lifecycle.is_running()?;
            if running {
                println!("{}", formatter.success("Database container is running"));
            } else {
                println!("{}", formatter.warning("Database container is not running"));
            }
            Ok(running)
        }
    }
}
