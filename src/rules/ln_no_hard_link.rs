use super::{sudo_aware_match, sudo_aware_new_command, NewCommand, Rule};
use crate::types::Command;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

const HARD_LINK_ERROR: &str = "hard link not allowed for directory";

static LEADING_LN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ln ").expect("valid regex"));

/// `ln` refuses to hard link directories; offer a symbolic link instead.
pub struct LnNoHardLink;

impl Rule for LnNoHardLink {
    fn name(&self) -> &str {
        "ln_no_hard_link"
    }

    fn is_match(&self, command: &Command) -> Result<bool> {
        sudo_aware_match(command, |command| {
            Ok(command.output().trim_end().ends_with(HARD_LINK_ERROR)
                && command.program() == Some("ln"))
        })
    }

    fn get_new_command(&self, command: &Command) -> Result<NewCommand> {
        sudo_aware_new_command(command, |command| {
            Ok(LEADING_LN.replace(command.script(), "ln -s ").into_owned().into())
        })
    }
}
