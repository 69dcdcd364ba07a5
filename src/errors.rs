//! Outcomes of a fix request that are surfaced to the caller.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeckError {
    /// Every rule was tried and none proposed a correction.
    #[error("no rule matched the command")]
    NoRuleMatched,

    /// The failed command was blank after trimming.
    #[error("empty command, nothing to do")]
    EmptyCommand,
}
