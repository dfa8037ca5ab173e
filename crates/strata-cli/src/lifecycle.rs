//! Start, stop and probe the database container.
//!
//! Drives `docker compose` and `docker inspect` through a [`CommandRunner`]
//! so the polling logic can be tested without Docker.

use crate::config::LifecycleSettings;
use crate::error::{CliError, Result};
use std::io;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use strata_pipeline::Sleeper;
use tracing::{debug, info, warn};

/// Captured result of an external command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// Whether the command exited with status 0
    pub success: bool,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Runs external programs.
pub trait CommandRunner {
    /// Run `program` with `args` and wait for it to finish
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Result of `db start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The container was running before the call
    AlreadyRunning,
    /// The container was started and reported healthy
    Healthy,
    /// The container was started but never reported healthy
    TimedOut,
}

/// Manages the database container.
pub struct Lifecycle<'a, R> {
    runner: R,
    settings: &'a LifecycleSettings,
    sleeper: Arc<dyn Sleeper>,
}

impl<'a, R: CommandRunner> Lifecycle<'a, R> {
    /// Create a lifecycle manager.
    pub fn new(runner: R, settings: &'a LifecycleSettings, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            runner,
            settings,
            sleeper,
        }
    }

    fn docker(&self, args: &[&str]) -> Result<CommandOutput> {
        debug!(?args, "running docker");
        self.runner
            .run("docker", args)
            .map_err(|e| CliError::Lifecycle(format!("failed to run docker: {}", e)))
    }

    fn compose(&self, action: &[&str]) -> Result<()> {
        let file = self.settings.compose_file.to_string_lossy();
        let mut args = vec!["compose", "-f", &*file];
        args.extend_from_slice(action);

        let output = self.docker(&args)?;
        if !output.success {
            return Err(CliError::Lifecycle(format!(
                "docker compose {} failed: {}",
                action.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    /// Whether the container is listed by `docker ps`.
    pub fn is_running(&self) -> Result<bool> {
        let filter = format!("name={}", self.settings.container_name);
        let output = self.docker(&["ps", "--filter", filter.as_str(), "--format", "{{.Names}}"])?;
        Ok(output
            .stdout
            .lines()
            .any(|name| name.trim() == self.settings.container_name))
    }

    fn is_healthy(&self) -> Result<bool> {
        let output = self.docker(&[
            "inspect",
            "--format",
            "{{.State.Health.Status}}",
            self.settings.container_name.as_str(),
        ])?;
        Ok(output.success && output.stdout.trim().eq_ignore_ascii_case("healthy"))
    }

    /// Start the container and wait until it reports healthy.
    pub fn start(&self) -> Result<StartOutcome> {
        if self.is_running()? {
            info!(container = %self.settings.container_name, "already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        self.compose(&["up", "-d"])?;
        info!(container = %self.settings.container_name, "waiting for container health");

        let interval = Duration::from_secs(self.settings.health_interval_secs);
        for attempt in 0..self.settings.health_attempts {
            if attempt > 0 {
                self.sleeper.sleep(interval);
            }
            if self.is_healthy()? {
                info!(container = %self.settings.container_name, "container healthy");
                return Ok(StartOutcome::Healthy);
            }
            debug!(attempt = attempt + 1, "container not healthy yet");
        }

        warn!(
            container = %self.settings.container_name,
            attempts = self.settings.health_attempts,
            "timed out waiting for container health"
        );
        Ok(StartOutcome::TimedOut)
    }

    /// Stop and remove the container.
    pub fn stop(&self) -> Result<()> {
        self.compose(&["down"])?;
        info!(container = %self.settings.container_name, "container stopped");
        Ok(())
    }
}
