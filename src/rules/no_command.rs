use super::{sudo_aware_match, sudo_aware_new_command, NewCommand, Rule};
use crate::providers::SystemProvider;
use crate::types::Command;
use anyhow::{anyhow, Result};
use std::cmp::Ordering;
use std::sync::Arc;

/// Minimum similarity for an executable to count as a close match.
const CUTOFF: f64 = 0.6;

/// Suggests installed programs whose names are close to an unknown one.
pub struct NoCommand {
    system: Arc<dyn SystemProvider>,
    num_close_matches: usize,
}

impl NoCommand {
    pub fn new(system: Arc<dyn SystemProvider>, num_close_matches: usize) -> Self {
        Self {
            system,
            num_close_matches,
        }
    }

    fn close_matches(&self, word: &str) -> Vec<String> {
        get_close_matches(word, &self.system.executables(), self.num_close_matches, CUTOFF)
    }
}

impl Rule for NoCommand {
    fn name(&self) -> &str {
        "no_command"
    }

    fn priority(&self) -> i32 {
        3000
    }

    fn is_match(&self, command: &Command) -> Result<bool> {
        sudo_aware_match(command, |command| {
            let Some(program) = command.program() else {
                return Ok(false);
            };
            let output = command.output();
            Ok(!self.system.program_exists(program)
                && (output.contains("not found") || output.contains("is not recognized as"))
                && !self.close_matches(program).is_empty())
        })
    }

    fn get_new_command(&self, command: &Command) -> Result<NewCommand> {
        sudo_aware_new_command(command, |command| {
            let program = command
                .program()
                .ok_or_else(|| anyhow!("empty script"))?;
            Ok(self
                .close_matches(program)
                .iter()
                .map(|candidate| command.script().replacen(program, candidate, 1))
                .collect::<Vec<_>>()
                .into())
        })
    }
}

/// Best `n` candidates scoring at least `cutoff`, most similar first.
fn get_close_matches(word: &str, candidates: &[String], n: usize, cutoff: f64) -> Vec<String> {
    let mut scored: Vec<(f64, &String)> = candidates
        .iter()
        .map(|candidate| (strsim::normalized_damerau_levenshtein(word, candidate), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(n).map(|(_, name)| name.clone()).collect()
}
