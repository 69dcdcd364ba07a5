//! Shared provider traits for dependency injection.
//!
//! Rules look at the host (environment variables, files on disk, programs
//! on `PATH`). Going through [`SystemProvider`] keeps them testable with a
//! mock host instead of the real one.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Names of our own entry points, never suggested as corrections.
const OWN_EXECUTABLES: &[&str] = &["theheck", "heck"];

/// Trait for probing the host system.
///
/// # Example
///
/// ```
/// use theheck::providers::{HostSystem, SystemProvider};
///
/// let host = HostSystem::new(Vec::new());
/// assert!(host.env_var("THEHECK_SURELY_UNSET_VARIABLE").is_none());
/// ```
pub trait SystemProvider: Send + Sync {
    /// Returns the value of an environment variable, if set.
    fn env_var(&self, key: &str) -> Option<String>;

    /// Checks if `path` exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Checks if a program can be resolved through `PATH`.
    fn program_exists(&self, program: &str) -> bool;

    /// Names of every executable found in the `PATH` directories.
    fn executables(&self) -> Vec<String>;
}

/// Default provider backed by the real process environment.
pub struct HostSystem {
    excluded_prefixes: Vec<String>,
    executables: OnceLock<Vec<String>>,
}

impl HostSystem {
    /// `excluded_prefixes` are `PATH` entries skipped when listing executables.
    pub fn new(excluded_prefixes: Vec<String>) -> Self {
        Self {
            excluded_prefixes,
            executables: OnceLock::new(),
        }
    }

    fn scan_path(&self) -> Vec<String> {
        let Some(path) = env::var_os("PATH") else {
            return Vec::new();
        };

        let mut names = BTreeSet::new();
        for dir in env::split_paths(&path) {
            let dir_str = dir.to_string_lossy();
            if self
                .excluded_prefixes
                .iter()
                .any(|prefix| dir_str.starts_with(prefix.as_str()))
            {
                continue;
            }
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                if entry.path().is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if !OWN_EXECUTABLES.contains(&name.as_str()) {
                    names.insert(name);
                }
            }
        }
        names.into_iter().collect()
    }
}

impl SystemProvider for HostSystem {
    fn env_var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn executables(&self) -> Vec<String> {
        self.executables.get_or_init(|| self.scan_path()).clone()
    }
}
