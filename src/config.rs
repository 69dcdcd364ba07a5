use anyhow::{anyhow, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Marker accepted in `rules` meaning "every rule enabled by default".
pub const ALL_ENABLED: &str = "ALL_ENABLED";

/// Alias of [`ALL_ENABLED`] accepted in the `THEHECK_RULES` variable.
const DEFAULT_RULES_ENV: &str = "DEFAULT_RULES";

const SETTINGS_HEADER: &str = "# theheck settings file
#
# Rules are selected by name, for example:
#
# rules = [\"cd_parent\", \"sudo\", \"no_command\"]
#
# The default values are as follows. Uncomment and change to fit your needs.
#

";

/// One entry of the `rules` setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleSelection {
    AllEnabled,
    Named(String),
}

impl From<String> for RuleSelection {
    fn from(value: String) -> Self {
        if value == ALL_ENABLED {
            RuleSelection::AllEnabled
        } else {
            RuleSelection::Named(value)
        }
    }
}

impl From<&str> for RuleSelection {
    fn from(value: &str) -> Self {
        RuleSelection::from(value.to_string())
    }
}

impl From<RuleSelection> for String {
    fn from(value: RuleSelection) -> Self {
        match value {
            RuleSelection::AllEnabled => ALL_ENABLED.to_string(),
            RuleSelection::Named(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rules: Vec<RuleSelection>,
    pub exclude_rules: Vec<String>,
    pub require_confirmation: bool,
    /// Seconds a rule (or the re-run of the failed command) may take.
    pub wait_command: f64,
    /// Budget used instead of `wait_command` for `slow_commands`.
    pub wait_slow_command: f64,
    pub slow_commands: Vec<String>,
    pub num_close_matches: usize,
    pub no_colors: bool,
    pub debug: bool,
    pub excluded_search_path_prefixes: Vec<String>,
    pub fix_line_cmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_col_cmd: Option<String>,
    // Tables last so the TOML rendering stays valid.
    pub priority: BTreeMap<String, i32>,
    /// Extra environment for the re-run of the failed command.
    pub env: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: vec![RuleSelection::AllEnabled],
            exclude_rules: Vec::new(),
            require_confirmation: true,
            wait_command: 3.0,
            wait_slow_command: 15.0,
            slow_commands: ["lein", "react-native", "gradle", "./gradlew", "vagrant"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            num_close_matches: 3,
            no_colors: false,
            debug: false,
            excluded_search_path_prefixes: Vec::new(),
            fix_line_cmd: "{editor} {file} +{line}".to_string(),
            fix_col_cmd: None,
            priority: BTreeMap::new(),
            env: [("LC_ALL", "C"), ("LANG", "C"), ("GIT_TRACE", "1")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Settings {
    /// Load settings from the settings file and environment, falling back to defaults.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from_file().unwrap_or_else(|e| {
            info!("Using default settings: {}", e);
            Self::default()
        });

        // Environment variables override the settings file
        settings.apply_env(|key| std::env::var(key).ok());

        Ok(settings)
    }

    /// Applies command line overrides on top of the loaded settings.
    pub fn apply_args(&mut self, yes: bool, debug: bool) {
        if yes {
            self.require_confirmation = false;
        }
        if debug {
            self.debug = true;
        }
    }

    fn load_from_file() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        if !settings_path.exists() {
            return Err(anyhow!("settings file not found"));
        }
        let content = fs::read_to_string(&settings_path)?;
        match Self::from_toml(&content) {
            Ok(settings) => {
                info!("Loaded settings from: {}", settings_path.display());
                Ok(settings)
            }
            Err(e) => {
                warn!("Can't load settings from {}: {}", settings_path.display(), e);
                Err(e)
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overrides fields from `THEHECK_*` variables resolved through `lookup`.
    ///
    /// Malformed values are logged and skipped.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("THEHECK_RULES") {
            self.rules = split_list(&value)
                .into_iter()
                .map(|name| {
                    if name == DEFAULT_RULES_ENV {
                        RuleSelection::AllEnabled
                    } else {
                        RuleSelection::from(name)
                    }
                })
                .collect();
        }
        if let Some(value) = lookup("THEHECK_EXCLUDE_RULES") {
            self.exclude_rules = split_list(&value);
        }
        if let Some(value) = lookup("THEHECK_SLOW_COMMANDS") {
            self.slow_commands = split_list(&value);
        }
        if let Some(value) = lookup("THEHECK_EXCLUDED_SEARCH_PATH_PREFIXES") {
            self.excluded_search_path_prefixes = split_list(&value);
        }
        if let Some(value) = lookup("THEHECK_PRIORITY") {
            self.priority = parse_priority(&value);
        }
        if let Some(value) = lookup("THEHECK_REQUIRE_CONFIRMATION") {
            self.require_confirmation = parse_bool(&value);
        }
        if let Some(value) = lookup("THEHECK_NO_COLORS") {
            self.no_colors = parse_bool(&value);
        }
        if let Some(value) = lookup("THEHECK_DEBUG") {
            self.debug = parse_bool(&value);
        }
        if let Some(value) = lookup("THEHECK_WAIT_COMMAND") {
            match parse_seconds(&value) {
                Some(seconds) => self.wait_command = seconds,
                None => warn!("Ignoring THEHECK_WAIT_COMMAND={:?}", value),
            }
        }
        if let Some(value) = lookup("THEHECK_WAIT_SLOW_COMMAND") {
            match parse_seconds(&value) {
                Some(seconds) => self.wait_slow_command = seconds,
                None => warn!("Ignoring THEHECK_WAIT_SLOW_COMMAND={:?}", value),
            }
        }
        if let Some(value) = lookup("THEHECK_NUM_CLOSE_MATCHES") {
            match value.trim().parse() {
                Ok(n) => self.num_close_matches = n,
                Err(_) => warn!("Ignoring THEHECK_NUM_CLOSE_MATCHES={:?}", value),
            }
        }
    }

    /// Time budget for evaluating `script`: slow commands get `wait_slow_command`.
    pub fn wait_budget(&self, script: &str) -> Duration {
        let is_slow = script
            .split_whitespace()
            .next()
            .is_some_and(|program| self.slow_commands.iter().any(|slow| slow == program));
        let seconds = if is_slow {
            self.wait_slow_command
        } else {
            self.wait_command
        };
        match Duration::try_from_secs_f64(seconds) {
            Ok(budget) => budget,
            // Too large to represent
            Err(_) if seconds > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        }
    }

    fn get_settings_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("settings.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let config = config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config.join("theheck"))
    }

    /// Writes a commented out settings template if no settings file exists yet.
    pub fn init_file() -> Result<()> {
        let settings_path = Self::get_settings_path()?;
        if settings_path.exists() {
            return Ok(());
        }
        if let Some(parent) = settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&settings_path, Self::default().render_template()?)?;
        info!("Created settings template at: {}", settings_path.display());
        Ok(())
    }

    fn render_template(&self) -> Result<String> {
        let body = toml::to_string_pretty(self)?;
        let mut template = SETTINGS_HEADER.to_string();
        for line in body.lines() {
            if line.is_empty() {
                template.push('\n');
            } else {
                template.push_str("# ");
                template.push_str(line);
                template.push('\n');
            }
        }
        Ok(template)
    }

    pub fn show_config_info(&self) -> Result<()> {
        let settings_path = Self::get_settings_path()?;
        println!("Settings file: {}", settings_path.display());
        println!(
            "Status: {}",
            if settings_path.exists() { "Found" } else { "Not found (using defaults)" }
        );
        println!("\nEffective settings:\n");
        print!("{}", toml::to_string_pretty(self)?);
        println!("\nEnvironment variables prefixed with THEHECK_ override the file.");
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(':')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// A finite, non-negative number of seconds.
fn parse_seconds(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

fn parse_priority(value: &str) -> BTreeMap<String, i32> {
    value
        .split(':')
        .filter_map(|part| {
            let (name, priority) = part.split_once('=')?;
            match priority.trim().parse() {
                Ok(priority) => Some((name.trim().to_string(), priority)),
                Err(_) => {
                    warn!("Ignoring malformed priority entry {:?}", part);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.rules, vec![RuleSelection::AllEnabled]);
        assert!(settings.require_confirmation);
        assert_eq!(settings.wait_command, 3.0);
        assert_eq!(settings.wait_slow_command, 15.0);
        assert_eq!(settings.num_close_matches, 3);
        assert!(settings.slow_commands.contains(&"gradle".to_string()));
        assert_eq!(settings.env.get("LC_ALL").map(String::as_str), Some("C"));
        assert!(settings.fix_col_cmd.is_none());
    }

    #[test]
    fn test_from_toml_parses_all_enabled_marker() {
        let settings = Settings::from_toml(
            r#"
rules = ["ALL_ENABLED", "rm_root"]
exclude_rules = ["sudo"]
wait_command = 1

[priority]
no_command = 10
"#,
        )
        .unwrap();

        assert_eq!(
            settings.rules,
            vec![RuleSelection::AllEnabled, RuleSelection::Named("rm_root".to_string())]
        );
        assert_eq!(settings.exclude_rules, vec!["sudo".to_string()]);
        assert_eq!(settings.wait_command, 1.0);
        assert_eq!(settings.priority.get("no_command"), Some(&10));
        // Untouched fields keep their defaults
        assert!(settings.require_confirmation);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(Settings::from_toml("rules = 5").is_err());
    }

    #[test]
    fn test_env_overrides_lists_and_flags() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("THEHECK_RULES", "DEFAULT_RULES:cd_parent"),
            ("THEHECK_EXCLUDE_RULES", "sudo:no_command"),
            ("THEHECK_REQUIRE_CONFIRMATION", "False"),
            ("THEHECK_DEBUG", "TRUE"),
            ("THEHECK_SLOW_COMMANDS", "mvn"),
        ]));

        assert_eq!(
            settings.rules,
            vec![RuleSelection::AllEnabled, RuleSelection::Named("cd_parent".to_string())]
        );
        assert_eq!(settings.exclude_rules, vec!["sudo", "no_command"]);
        assert!(!settings.require_confirmation);
        assert!(settings.debug);
        assert_eq!(settings.slow_commands, vec!["mvn"]);
    }

    #[test]
    fn test_env_priority_skips_malformed_parts() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[("THEHECK_PRIORITY", "rule_a=1:broken:rule_b=x:rule_c=30")]));

        assert_eq!(settings.priority.len(), 2);
        assert_eq!(settings.priority.get("rule_a"), Some(&1));
        assert_eq!(settings.priority.get("rule_c"), Some(&30));
    }

    #[test]
    fn test_env_ignores_unparseable_numbers() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("THEHECK_WAIT_COMMAND", "soon"),
            ("THEHECK_NUM_CLOSE_MATCHES", "5"),
        ]));

        assert_eq!(settings.wait_command, 3.0);
        assert_eq!(settings.num_close_matches, 5);
    }

    #[test]
    fn test_env_ignores_non_finite_waits() {
        let mut settings = Settings::default();
        settings.apply_env(env(&[
            ("THEHECK_WAIT_COMMAND", "inf"),
            ("THEHECK_WAIT_SLOW_COMMAND", "-2"),
        ]));

        assert_eq!(settings.wait_command, 3.0);
        assert_eq!(settings.wait_slow_command, 15.0);

        settings.apply_env(env(&[("THEHECK_WAIT_COMMAND", " 0.5 ")]));
        assert_eq!(settings.wait_command, 0.5);
    }

    #[test]
    fn test_wait_budget_saturates_huge_values() {
        let settings = Settings {
            wait_command: 1e300,
            wait_slow_command: f64::INFINITY,
            ..Settings::default()
        };
        assert_eq!(settings.wait_budget("ls"), Duration::MAX);
        assert_eq!(settings.wait_budget("gradle build"), Duration::MAX);
    }

    #[test]
    fn test_apply_args() {
        let mut settings = Settings::default();
        settings.apply_args(true, true);
        assert!(!settings.require_confirmation);
        assert!(settings.debug);
    }

    #[test]
    fn test_wait_budget_uses_slow_budget_for_slow_commands() {
        let settings = Settings::default();
        assert_eq!(settings.wait_budget("gradle build"), Duration::from_secs(15));
        assert_eq!(settings.wait_budget("git status"), Duration::from_secs(3));
        assert_eq!(settings.wait_budget(""), Duration::from_secs(3));
    }

    #[test]
    fn test_wait_budget_clamps_negative_values() {
        let settings = Settings {
            wait_command: -1.0,
            ..Settings::default()
        };
        assert_eq!(settings.wait_budget("ls"), Duration::ZERO);
    }

    #[test]
    fn test_template_is_fully_commented_and_parses_back() {
        let template = Settings::default().render_template().unwrap();
        assert!(template.starts_with("# theheck settings file"));
        assert!(template.lines().all(|line| line.is_empty() || line.starts_with('#')));

        let uncommented: String = template
            .strip_prefix(SETTINGS_HEADER)
            .unwrap()
            .lines()
            .map(|line| line.strip_prefix("# ").unwrap_or(line))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(Settings::from_toml(&uncommented).unwrap(), Settings::default());
    }
}
