//! Value types shared by the rules, the correction engine and the UI.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// Callback a rule wants run once its corrected script has been executed.
///
/// Receives the original failed command and the script that replaced it.
pub type SideEffect = Arc<dyn Fn(&Command, &str) -> Result<()> + Send + Sync>;

/// A failed shell invocation and the output it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    script: String,
    output: String,
}

impl Command {
    /// Creates a command from its script and combined stdout/stderr.
    pub fn new(script: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            output: output.into(),
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Whitespace separated tokens of the script.
    pub fn script_parts(&self) -> Vec<&str> {
        self.script.split_whitespace().collect()
    }

    /// First token of the script, if any.
    pub fn program(&self) -> Option<&str> {
        self.script.split_whitespace().next()
    }

    /// Returns a copy of this command with a different script and the same output.
    pub fn with_script(&self, script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            output: self.output.clone(),
        }
    }
}

/// One proposed replacement for a failed command.
#[derive(Clone)]
pub struct CorrectedCommand {
    pub script: String,
    pub side_effect: Option<SideEffect>,
    pub priority: i32,
}

impl CorrectedCommand {
    pub fn new(script: impl Into<String>, side_effect: Option<SideEffect>, priority: i32) -> Self {
        Self {
            script: script.into(),
            side_effect,
            priority,
        }
    }

    /// Key used to detect candidates proposing the same script.
    pub fn normalized_script(&self) -> &str {
        self.script.trim()
    }

    /// Runs the side effect, if the rule attached one.
    pub fn run_side_effect(&self, old_command: &Command) -> Result<()> {
        match &self.side_effect {
            Some(effect) => effect(old_command, &self.script),
            None => Ok(()),
        }
    }
}

impl PartialEq for CorrectedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.script == other.script && self.priority == other.priority
    }
}

impl fmt::Debug for CorrectedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrectedCommand")
            .field("script", &self.script)
            .field("side_effect", &self.side_effect.is_some())
            .field("priority", &self.priority)
            .finish()
    }
}
