//! theheck - corrects the shell command that just failed.
//!
//! Given a failed command and the output it produced, this library asks a
//! set of independent rules for replacements and lets the user pick one.
//! It supports:
//!
//! - **Rule registry** ordering the enabled rules by priority
//! - **Lazy corrections** so the first candidate shows up before slow rules run
//! - **Fault isolation** where a rule that errors, panics or hangs contributes nothing
//! - **Interactive selection** with arrow, vi and colemak keys
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Settings file, environment overrides and defaults
//! - [`types`] - Failed commands and their corrections
//! - [`rules`] - The rule capability and the built-in rules
//! - [`registry`] - Selects and orders the enabled rules
//! - [`corrector`] - Evaluates rules into a lazy stream of candidates
//! - [`selector`] - Cursor over the candidates
//! - [`keys`] - Raw terminal key input
//! - [`ui`] - The interactive selection loop
//! - [`rerun`] - Re-runs the failed command to capture its output
//! - [`executor`] - Prints or runs the chosen correction
//! - [`fixer`] - Ties one fix request together
//! - [`providers`] - Host lookups behind a trait
//!
//! # Example
//!
//! ```ignore
//! use theheck::config::Settings;
//! use theheck::executor::ExecutionMode;
//! use theheck::fixer::Fixer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fixer = Fixer::new(Settings::load()?, ExecutionMode::Print);
//!
//!     // Prints `git status` once the user confirms it
//!     fixer.fix(&["gti".to_string(), "status".to_string()]).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Shell integration
//!
//! In print mode only the chosen script reaches stdout, so a shell function
//! can evaluate it:
//!
//! ```bash
//! heck() { eval "$(TF_ALIAS=heck theheck $(fc -ln -1))"; }
//! ```

pub mod config;
pub mod corrector;
pub mod errors;
pub mod executor;
pub mod fixer;
pub mod keys;
pub mod providers;
pub mod registry;
pub mod rerun;
pub mod rules;
pub mod selector;
pub mod types;
pub mod ui;
