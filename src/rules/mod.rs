//! Rule capability and the built-in rule catalog.
//!
//! A rule recognizes one kind of failure from a [`Command`] and proposes
//! replacement scripts for it. The catalog is a fixed table assembled once at
//! startup; which rules actually run, and in which order, is decided by the
//! [`crate::registry`].

use crate::config::Settings;
use crate::providers::SystemProvider;
use crate::types::{Command, SideEffect};
use anyhow::Result;
use std::sync::Arc;

mod cd_parent;
mod fix_file;
mod ln_no_hard_link;
mod no_command;
mod sudo;

pub use cd_parent::CdParent;
pub use fix_file::FixFile;
pub use ln_no_hard_link::LnNoHardLink;
pub use no_command::NoCommand;
pub use sudo::Sudo;

/// Priority of a rule that does not declare one. Lower runs first.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Replacement script(s) proposed by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewCommand {
    Single(String),
    /// Several ranked alternatives, best first.
    Many(Vec<String>),
}

impl NewCommand {
    pub fn into_scripts(self) -> Vec<String> {
        match self {
            NewCommand::Single(script) => vec![script],
            NewCommand::Many(scripts) => scripts,
        }
    }

    /// Applies `f` to every proposed script, keeping the shape.
    pub fn map(self, f: impl Fn(String) -> String) -> Self {
        match self {
            NewCommand::Single(script) => NewCommand::Single(f(script)),
            NewCommand::Many(scripts) => NewCommand::Many(scripts.into_iter().map(f).collect()),
        }
    }
}

impl From<String> for NewCommand {
    fn from(script: String) -> Self {
        NewCommand::Single(script)
    }
}

impl From<&str> for NewCommand {
    fn from(script: &str) -> Self {
        NewCommand::Single(script.to_string())
    }
}

impl From<Vec<String>> for NewCommand {
    fn from(scripts: Vec<String>) -> Self {
        NewCommand::Many(scripts)
    }
}

/// A named heuristic that fixes one kind of failed command.
///
/// Errors (and panics) raised by `is_match` or `get_new_command` are
/// contained by the correction engine: the rule simply contributes nothing.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Rules requiring output are never tried against a command without output.
    fn requires_output(&self) -> bool {
        true
    }

    fn is_match(&self, command: &Command) -> Result<bool>;

    /// Only called after `is_match` returned `true` for the same command.
    fn get_new_command(&self, command: &Command) -> Result<NewCommand>;

    fn side_effect(&self) -> Option<SideEffect> {
        None
    }
}

/// The built-in rules in declaration order, which breaks priority ties.
pub fn builtin(settings: &Settings, system: Arc<dyn SystemProvider>) -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(CdParent),
        Arc::new(FixFile::new(
            Arc::clone(&system),
            settings.fix_line_cmd.clone(),
            settings.fix_col_cmd.clone(),
        )),
        Arc::new(LnNoHardLink),
        Arc::new(NoCommand::new(Arc::clone(&system), settings.num_close_matches)),
        Arc::new(Sudo),
    ]
}

const SUDO_PREFIX: &str = "sudo ";

/// Runs `check` against the command with a leading `sudo ` removed.
pub(crate) fn sudo_aware_match<F>(command: &Command, check: F) -> Result<bool>
where
    F: FnOnce(&Command) -> Result<bool>,
{
    match command.script().strip_prefix(SUDO_PREFIX) {
        Some(rest) => check(&command.with_script(rest)),
        None => check(command),
    }
}

/// Like [`sudo_aware_match`], re-adding `sudo ` to every produced script.
pub(crate) fn sudo_aware_new_command<F>(command: &Command, build: F) -> Result<NewCommand>
where
    F: FnOnce(&Command) -> Result<NewCommand>,
{
    match command.script().strip_prefix(SUDO_PREFIX) {
        Some(rest) => {
            let new_command = build(&command.with_script(rest))?;
            Ok(new_command.map(|script| format!("{}{}", SUDO_PREFIX, script)))
        }
        None => build(command),
    }
}
