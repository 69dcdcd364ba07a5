//! Drives one fix request from the raw failed command to its execution.

use crate::config::Settings;
use crate::corrector::{get_corrected_commands, CorrectedCommands};
use crate::executor::{ExecutionMode, Executor};
use crate::providers::{HostSystem, SystemProvider};
use crate::registry::RuleRegistry;
use crate::rerun;
use crate::rules;
use crate::types::Command;
use crate::ui::{self, Selection};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct Fixer {
    settings: Settings,
    registry: RuleRegistry,
    executor: Executor,
}

impl Fixer {
    /// Creates a fixer probing the real host.
    pub fn new(settings: Settings, mode: ExecutionMode) -> Self {
        let system = Arc::new(HostSystem::new(settings.excluded_search_path_prefixes.clone()));
        Self::with_system(settings, system, mode)
    }

    /// Creates a fixer with a custom host provider (for testing).
    pub fn with_system(settings: Settings, system: Arc<dyn SystemProvider>, mode: ExecutionMode) -> Self {
        let registry = RuleRegistry::new(rules::builtin(&settings, system));
        Self {
            settings,
            registry,
            executor: Executor::new(mode),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rebuilds the failed command from the raw CLI words, re-running it to
    /// capture its output.
    pub async fn command_from_raw(&self, raw: &[String]) -> Result<Command> {
        let script = rerun::format_raw_script(raw)?;
        let output = rerun::get_output(&script, &self.settings).await?.unwrap_or_default();
        Ok(Command::new(script, output))
    }

    /// Lazy candidates for `command`, best first.
    pub fn corrections(&self, command: Command) -> CorrectedCommands {
        let rules = self.registry.resolve(&self.settings);
        get_corrected_commands(command, rules, &self.settings)
    }

    /// Proposes corrections for the failed command, lets the user choose one
    /// and executes the choice.
    pub async fn fix(&self, raw: &[String]) -> Result<Selection> {
        let command = self.command_from_raw(raw).await?;
        info!("Fixing `{}` ({} bytes of output)", command.script(), command.output().len());

        let selection = ui::select_command(self.corrections(command.clone()), &self.settings)?;

        match &selection {
            Selection::Selected(selected) => self.executor.execute(selected, &command)?,
            Selection::Aborted => info!("Selection aborted"),
            Selection::NoRuleMatched => info!("No rule matched `{}`", command.script()),
        }
        Ok(selection)
    }
}
