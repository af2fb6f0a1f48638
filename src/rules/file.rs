//! Rule files on disk.

use crate::rules::{PocRule, RuleError};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Loads `*.yml` and `*.yaml` rule files under a directory tree.
pub struct FileRuleSource {
    root: PathBuf,
}

impl FileRuleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse and validate every rule file under the root, sorted by name.
    ///
    /// A single malformed file fails the whole load; skipping rules
    /// silently would let a scan claim coverage it does not have.
    pub fn load(&self) -> Result<Vec<PocRule>, RuleError> {
        let mut rules = Vec::new();
        for ext in ["yml", "yaml"] {
            let pattern = self.root.join(format!("**/*.{ext}"));
            let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| {
                RuleError::BadSelector {
                    pattern: pattern.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            for entry in entries {
                let path = entry.map_err(|e| RuleError::Io(e.into_error()))?;
                let text = fs::read_to_string(&path)?;
                let rule: PocRule =
                    serde_yaml::from_str(&text).map_err(|e| RuleError::Malformed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                rule.validate()?;
                debug!(rule = %rule.name, file = %path.display(), "loaded rule file");
                rules.push(rule);
            }
        }
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const GOOD: &str = r#"
name: shiro-default-key
severity: high
probes:
  - path: /login
    headers:
      Cookie: "rememberMe=1"
    matcher:
      header_contains:
        name: Set-Cookie
        value: rememberMe=deleteMe
"#;

    #[test]
    fn test_load_sorted_including_nested_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("zz.yml"), GOOD).unwrap();
        fs::create_dir(dir.path().join("web")).unwrap();
        fs::write(
            dir.path().join("web/aa.yaml"),
            "name: aaa-probe\nprobes:\n  - path: /\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a rule").unwrap();

        let rules = FileRuleSource::new(dir.path()).load().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "aaa-probe");
        assert_eq!(rules[1].name, "shiro-default-key");
    }

    #[test]
    fn test_empty_directory_loads_nothing() {
        let dir = tempdir().unwrap();
        let rules = FileRuleSource::new(dir.path()).load().unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_malformed_file_fails_the_load() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ok.yml"), GOOD).unwrap();
        fs::write(dir.path().join("broken.yml"), "name: [unterminated").unwrap();

        let result = FileRuleSource::new(dir.path()).load();
        assert!(matches!(result, Err(RuleError::Malformed { .. })));
    }

    #[test]
    fn test_invalid_rule_fails_the_load() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("bad.yml"),
            "name: bad-regex\nprobes:\n  - path: /\n    matcher:\n      body_matches: \"[unclosed\"\n",
        )
        .unwrap();

        let result = FileRuleSource::new(dir.path()).load();
        assert!(matches!(result, Err(RuleError::InvalidPattern { .. })));
    }
}
