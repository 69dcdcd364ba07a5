//! Correction engine: evaluates rules against a failed command and streams
//! the corrected commands they propose.
//!
//! Rules are evaluated lazily, one per pull, in registry order. A rule that
//! returns an error, panics or exceeds its time budget is logged and treated
//! as not matching, so one broken rule never stops the sweep.

use crate::config::Settings;
use crate::registry::RegisteredRule;
use crate::types::{Command, CorrectedCommand};
use anyhow::Result;
use std::collections::{HashSet, VecDeque};
use std::panic;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of evaluating one rule against one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Matched(Vec<String>),
    NotMatched,
    TimedOut,
    Faulted(String),
}

/// Evaluates `is_match` and, on a match, `get_new_command` within `budget`.
///
/// The rule runs on its own thread. When the budget elapses the thread is
/// abandoned and its eventual result discarded.
pub fn evaluate_rule(registered: &RegisteredRule, command: &Arc<Command>, budget: Duration) -> RuleOutcome {
    let (tx, rx) = mpsc::channel();
    let rule = Arc::clone(&registered.rule);
    let command = Arc::clone(command);

    let spawned = thread::Builder::new()
        .name(format!("{}{}", RULE_THREAD_PREFIX, registered.name()))
        .spawn(move || {
            let result = (|| -> Result<Option<Vec<String>>> {
                if !rule.is_match(&command)? {
                    return Ok(None);
                }
                Ok(Some(rule.get_new_command(&command)?.into_scripts()))
            })();
            // The receiver is gone if we already timed out
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        return RuleOutcome::Faulted(format!("failed to spawn rule thread: {}", e));
    }

    match rx.recv_timeout(budget) {
        Ok(Ok(Some(scripts))) => RuleOutcome::Matched(scripts),
        Ok(Ok(None)) => RuleOutcome::NotMatched,
        Ok(Err(e)) => RuleOutcome::Faulted(format!("{:#}", e)),
        Err(RecvTimeoutError::Timeout) => RuleOutcome::TimedOut,
        Err(RecvTimeoutError::Disconnected) => RuleOutcome::Faulted("rule panicked".to_string()),
    }
}

/// Prefix of the names of the threads rules are evaluated on.
const RULE_THREAD_PREFIX: &str = "rule-";

fn is_rule_thread(name: Option<&str>) -> bool {
    name.is_some_and(|name| name.starts_with(RULE_THREAD_PREFIX))
}

/// Reports panics on rule threads through `tracing` instead of the default
/// hook, which would print over the selection prompt on stderr.
///
/// Panics on any other thread still go to the previously installed hook.
pub fn install_rule_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let thread = thread::current();
        let Some(name) = thread.name().filter(|name| is_rule_thread(Some(name))) else {
            previous(info);
            return;
        };
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        match info.location() {
            Some(location) => warn!("Thread {} panicked at {}: {}", name, location, payload),
            None => warn!("Thread {} panicked: {}", name, payload),
        }
    }));
}

/// Lazy, deduplicated sequence of corrected commands for one failed command.
pub struct CorrectedCommands {
    command: Arc<Command>,
    rules: std::vec::IntoIter<RegisteredRule>,
    budget: Duration,
    pending: VecDeque<CorrectedCommand>,
    seen: HashSet<String>,
}

/// Starts a sweep of `rules` over `command`. Nothing is evaluated until pulled.
pub fn get_corrected_commands(command: Command, rules: Vec<RegisteredRule>, settings: &Settings) -> CorrectedCommands {
    let budget = settings.wait_budget(command.script());
    CorrectedCommands {
        command: Arc::new(command),
        rules: rules.into_iter(),
        budget,
        pending: VecDeque::new(),
        seen: HashSet::new(),
    }
}

impl CorrectedCommands {
    fn evaluate_next_rule(&mut self) -> bool {
        let Some(registered) = self.rules.next() else {
            return false;
        };

        if registered.rule.requires_output() && self.command.output().is_empty() {
            debug!("Skipping rule {}: command has no output", registered.name());
            return true;
        }

        let started = Instant::now();
        let outcome = evaluate_rule(&registered, &self.command, self.budget);
        debug!(
            "Trying rule: {}; took: {:?}; outcome: {:?}",
            registered.name(),
            started.elapsed(),
            outcome
        );

        match outcome {
            RuleOutcome::Matched(scripts) => {
                let side_effect = registered.rule.side_effect();
                self.pending.extend(
                    scripts
                        .into_iter()
                        .map(|script| CorrectedCommand::new(script, side_effect.clone(), registered.priority)),
                );
            }
            RuleOutcome::NotMatched => {}
            RuleOutcome::TimedOut => {
                warn!(
                    "Rule {} did not finish within {:?}, ignoring it",
                    registered.name(),
                    self.budget
                );
            }
            RuleOutcome::Faulted(reason) => {
                warn!("Rule {} failed: {}", registered.name(), reason);
            }
        }
        true
    }
}

impl Iterator for CorrectedCommands {
    type Item = CorrectedCommand;

    fn next(&mut self) -> Option<CorrectedCommand> {
        loop {
            while let Some(corrected) = self.pending.pop_front() {
                if self.seen.insert(corrected.normalized_script().to_string()) {
                    return Some(corrected);
                }
                debug!("Dropping duplicate candidate: {}", corrected.script);
            }
            if !self.evaluate_next_rule() {
                return None;
            }
        }
    }
}
