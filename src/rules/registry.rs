//! Rule registry and selection.

use crate::rules::{builtin_rules, FileRuleSource, Rule, RuleError, RuleSource};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// How a scan names the rules it wants to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLocator {
    /// Exactly one rule by name; a miss is an error.
    Exact(String),
    /// Glob over rule names, e.g. `thinkphp-*`; may select nothing.
    Pattern(String),
}

impl RuleLocator {
    /// Classify a raw selector: glob metacharacters make it a pattern.
    pub fn parse(raw: &str) -> Self {
        if raw.contains(['*', '?', '[']) {
            RuleLocator::Pattern(raw.to_string())
        } else {
            RuleLocator::Exact(raw.to_string())
        }
    }
}

/// All known rules, keyed and iterated by name.
#[derive(Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the compiled-in rule set.
    pub fn with_builtins() -> Self {
        let mut rules: BTreeMap<String, Arc<dyn Rule>> = BTreeMap::new();
        for rule in builtin_rules() {
            rules.insert(rule.name().to_string(), Arc::new(rule));
        }
        Self { rules }
    }

    /// Add one rule, rejecting name collisions.
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Result<(), RuleError> {
        let name = rule.name().to_string();
        if self.rules.contains_key(&name) {
            return Err(RuleError::Duplicate(name));
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    /// Load every YAML rule file under `dir` into the registry.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, RuleError> {
        let loaded = FileRuleSource::new(dir).load()?;
        let count = loaded.len();
        for rule in loaded {
            self.register(Arc::new(rule))?;
        }
        debug!(count, dir = %dir.display(), "registered rule files");
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self.rules.get(name).cloned()
    }

    /// Resolve a locator to concrete rules, in name order.
    pub fn select(&self, locator: &RuleLocator) -> Result<Vec<Arc<dyn Rule>>, RuleError> {
        match locator {
            RuleLocator::Exact(name) => {
                let rule = self
                    .rules
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RuleError::Unknown(name.clone()))?;
                Ok(vec![rule])
            }
            RuleLocator::Pattern(pattern) => {
                let glob =
                    glob::Pattern::new(pattern).map_err(|e| RuleError::BadSelector {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(self
                    .rules
                    .iter()
                    .filter(|(name, _)| glob.matches(name))
                    .map(|(_, rule)| Arc::clone(rule))
                    .collect())
            }
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleSource for RuleRegistry {
    fn load_one(&self, name: &str) -> Result<Arc<dyn Rule>, RuleError> {
        self.get(name)
            .ok_or_else(|| RuleError::Unknown(name.to_string()))
    }

    fn load_many(&self, locator: &RuleLocator) -> Result<Vec<Arc<dyn Rule>>, RuleError> {
        self.select(locator)
    }
}
