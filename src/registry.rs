//! Resolves the configured rule selection into one ordered rule list.

use crate::config::{RuleSelection, Settings};
use crate::rules::Rule;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A rule selected for evaluation, with its effective priority.
#[derive(Clone)]
pub struct RegisteredRule {
    pub rule: Arc<dyn Rule>,
    pub priority: i32,
}

impl RegisteredRule {
    pub fn name(&self) -> &str {
        self.rule.name()
    }
}

impl std::fmt::Debug for RegisteredRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredRule")
            .field("name", &self.name())
            .field("priority", &self.priority)
            .finish()
    }
}

pub struct RuleRegistry {
    catalog: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// `catalog` order is the tie-break between rules of equal priority.
    pub fn new(catalog: Vec<Arc<dyn Rule>>) -> Self {
        Self { catalog }
    }

    /// Enabled rules sorted by `(effective priority, catalog position)`.
    ///
    /// Unknown rule names in the settings are reported and otherwise ignored.
    pub fn resolve(&self, settings: &Settings) -> Vec<RegisteredRule> {
        let all_enabled = settings.rules.contains(&RuleSelection::AllEnabled);
        let named: HashSet<&str> = settings
            .rules
            .iter()
            .filter_map(|selection| match selection {
                RuleSelection::Named(name) => Some(name.as_str()),
                RuleSelection::AllEnabled => None,
            })
            .collect();
        let excluded: HashSet<&str> = settings.exclude_rules.iter().map(String::as_str).collect();

        self.warn_unknown(named.iter().chain(excluded.iter()).copied());

        let mut seen = HashSet::new();
        let mut selected: Vec<(usize, RegisteredRule)> = self
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, rule)| seen.insert(rule.name().to_string()))
            .filter(|(_, rule)| (all_enabled && rule.enabled_by_default()) || named.contains(rule.name()))
            .filter(|(_, rule)| !excluded.contains(rule.name()))
            .map(|(position, rule)| {
                let priority = settings
                    .priority
                    .get(rule.name())
                    .copied()
                    .unwrap_or_else(|| rule.priority());
                (
                    position,
                    RegisteredRule {
                        rule: Arc::clone(rule),
                        priority,
                    },
                )
            })
            .collect();

        selected.sort_by_key(|(position, registered)| (registered.priority, *position));

        let rules: Vec<RegisteredRule> = selected.into_iter().map(|(_, registered)| registered).collect();
        debug!("Resolved rules: {:?}", rules);
        rules
    }

    fn warn_unknown<'a>(&self, names: impl Iterator<Item = &'a str>) {
        for name in names {
            if !self.catalog.iter().any(|rule| rule.name() == name) {
                warn!("Ignoring unknown rule '{}' in settings", name);
            }
        }
    }
}
