//! Process runners.
//!
//! `SystemRunner` spawns real child processes; `DryRunRunner` only reports
//! what would run.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::process::Command;

use super::CommandSpec;
use crate::error::{Result, RunnerError};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code; `None` when the child was killed by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs one at a time, blocking until each exits.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the command to completion.
    ///
    /// A non-zero exit is reported through `ExitOutcome`, not as an error; errors
    /// are reserved for commands that could not be run at all.
    async fn run(&self, command: &CommandSpec) -> Result<ExitOutcome>;
}

/// Runs the command and converts a non-zero exit into `CommandFailed`.
pub async fn run_checked<R>(runner: &R, stage: &str, command: &CommandSpec) -> Result<()>
where
    R: ProcessRunner + ?Sized,
{
    info!("[{}] {}", stage, command);
    let outcome = runner.run(command).await?;
    if outcome.is_success() {
        Ok(())
    } else {
        Err(RunnerError::CommandFailed {
            stage: stage.to_string(),
            command: command.to_string(),
            code: outcome.code,
        })
    }
}

/// Spawns real processes with inherited stdio so trainer output streams to the terminal.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout_ms: Option<u64>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill children that run longer than `ms`
    pub fn with_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.timeout_ms = ms;
        self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExitOutcome> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        debug!("Spawned {} (pid {:?})", spec.program, child.id());

        let status = match self.timeout_ms {
            Some(ms) => {
                let waited = tokio::time::timeout(Duration::from_millis(ms), child.wait()).await;
                match waited {
                    Ok(status) => status?,
                    Err(_) => {
                        if let Err(e) = child.kill().await {
                            warn!("Failed to kill {} after timeout: {}", spec.program, e);
                        }
                        return Err(RunnerError::Timeout {
                            program: spec.program.clone(),
                            timeout_ms: ms,
                        });
                    }
                }
            }
            None => child.wait().await?,
        };

        Ok(ExitOutcome { code: status.code() })
    }
}

/// Prints each command instead of running it. Every command "succeeds".
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

#[async_trait]
impl ProcessRunner for DryRunRunner {
    async fn run(&self, command: &CommandSpec) -> Result<ExitOutcome> {
        println!("[dry-run] {}", command);
        Ok(ExitOutcome::success())
    }
}
