//! Hands the chosen correction over to the shell.
//!
//! By default the corrected script is printed on stdout so the shell alias
//! can `eval` it in the user's own shell. With `--run` it is executed here
//! through `sh -c` instead.

use crate::types::{Command, CorrectedCommand};
use anyhow::{anyhow, Result};
use std::io::Write;
use std::process::ExitStatus;
use tracing::{error, info};

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Trait for running system processes.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Runs a command attached to our stdin, stdout and stderr and waits for it.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

/// Default process runner using std::process::Command.
///
/// The child inherits the terminal so interactive corrections (an editor
/// opened by `fix_file`, a `sudo` password prompt) work.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        let mut cmd = std::process::Command::new(program);
        cmd.args(args);
        Ok(cmd.status()?)
    }
}

// =============================================================================
// Executor Implementation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Print the script for the calling shell to evaluate.
    #[default]
    Print,
    /// Run the script directly.
    Run,
}

pub struct Executor {
    mode: ExecutionMode,
}

impl Executor {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Executes `selected` against the real process table and stdout.
    pub fn execute(&self, selected: &CorrectedCommand, old_command: &Command) -> Result<()> {
        self.execute_with_io(selected, old_command, &SystemProcessRunner, &mut std::io::stdout())
    }

    /// Executes `selected` with injected dependencies (for testing).
    ///
    /// In print mode the side effect runs before the script is printed. In
    /// run mode it runs after the script, and only when the script succeeded.
    pub fn execute_with_io<P, W>(
        &self,
        selected: &CorrectedCommand,
        old_command: &Command,
        runner: &P,
        stdout: &mut W,
    ) -> Result<()>
    where
        P: ProcessRunner,
        W: Write,
    {
        match self.mode {
            ExecutionMode::Print => {
                selected.run_side_effect(old_command)?;
                writeln!(stdout, "{}", selected.script)?;
                stdout.flush()?;
            }
            ExecutionMode::Run => {
                info!("Running corrected command: {}", selected.script);
                let status = runner.run("sh", &["-c", &selected.script])?;
                if !status.success() {
                    error!("Command failed with status: {}", status);
                    return Err(anyhow!("Corrected command failed: {}", status));
                }
                selected.run_side_effect(old_command)?;
            }
        }
        Ok(())
    }
}
