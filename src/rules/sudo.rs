use super::{NewCommand, Rule};
use crate::types::Command;
use anyhow::Result;

/// Lowercased fragments of "you need to be root" style errors.
const PERMISSION_PATTERNS: &[&str] = &[
    "permission denied",
    "eacces",
    "pkg: insufficient privileges",
    "you cannot perform this operation unless you are root",
    "non-root users cannot",
    "operation not permitted",
    "not super-user",
    "superuser privilege",
    "root privilege",
    "this command has to be run under the root user.",
    "this operation requires root.",
    "requested operation requires superuser privilege",
    "must be run as root",
    "must run as root",
    "must be superuser",
    "must be root",
    "need to be root",
    "need root",
    "needs to be run as root",
    "only root can ",
    "you don't have access to the history db.",
    "authentication is required",
    "edspermissionerror",
    "you don't have write permissions",
    "use `sudo`",
    "sudorequirederror",
    "error: insufficient privileges",
    "updatedb: can not open a temporary file",
];

/// Re-runs a command that failed for lack of privileges with `sudo`.
pub struct Sudo;

impl Rule for Sudo {
    fn name(&self) -> &str {
        "sudo"
    }

    fn is_match(&self, command: &Command) -> Result<bool> {
        let parts = command.script_parts();
        if parts.first() == Some(&"sudo") && !parts.contains(&"&&") {
            return Ok(false);
        }
        let output = command.output().to_lowercase();
        Ok(PERMISSION_PATTERNS.iter().any(|pattern| output.contains(pattern)))
    }

    fn get_new_command(&self, command: &Command) -> Result<NewCommand> {
        let script = command.script();
        let new_script = if script.contains("&&") {
            let parts: Vec<&str> = command
                .script_parts()
                .into_iter()
                .filter(|part| *part != "sudo")
                .collect();
            format!("sudo sh -c \"{}\"", parts.join(" "))
        } else if script.contains('>') {
            format!("sudo sh -c \"{}\"", script.replace('"', "\\\""))
        } else {
            format!("sudo {}", script)
        };
        Ok(new_script.into())
    }
}
