use super::{NewCommand, Rule};
use crate::types::Command;
use anyhow::Result;

/// `cd..` is a common typo for `cd ..`.
pub struct CdParent;

impl Rule for CdParent {
    fn name(&self) -> &str {
        "cd_parent"
    }

    fn requires_output(&self) -> bool {
        false
    }

    fn is_match(&self, command: &Command) -> Result<bool> {
        Ok(command.script().trim() == "cd..")
    }

    fn get_new_command(&self, _command: &Command) -> Result<NewCommand> {
        Ok("cd ..".into())
    }
}
