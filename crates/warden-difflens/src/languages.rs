//! Maps changed paths to the languages and static checkers they imply.

use std::path::Path;

use tracing::warn;
use warden_core::{LanguageRule, ReviewConfig};

struct CompiledRule {
    name: String,
    checker: String,
    patterns: Vec<glob::Pattern>,
}

/// Glob-based language table.
///
/// # Examples
///
/// ```
/// use warden_core::ReviewConfig;
/// use warden_difflens::languages::LanguageMap;
///
/// let map = LanguageMap::from_config(&ReviewConfig::default());
/// let found = map.detect(["src/main.go", "tools/x.py", "lib/a.go"]);
/// assert_eq!(found, vec![("GO".to_string(), "golint".to_string()), ("Python".to_string(), "pylint-3".to_string())]);
/// ```
pub struct LanguageMap {
    rules: Vec<CompiledRule>,
}

impl LanguageMap {
    /// Build from the review configuration. Invalid patterns are skipped.
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::from_rules(&config.languages)
    }

    /// Build from explicit rules. Invalid patterns are skipped.
    pub fn from_rules(rules: &[LanguageRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| CompiledRule {
                name: rule.name.clone(),
                checker: rule.checker.clone(),
                patterns: rule
                    .patterns
                    .iter()
                    .filter_map(|pat| match glob::Pattern::new(pat) {
                        Ok(p) => Some(p),
                        Err(e) => {
                            warn!(pattern = %pat, "ignoring invalid language pattern: {e}");
                            None
                        }
                    })
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// Language of one path, if any rule matches its file name.
    pub fn language_of(&self, path: &str) -> Option<(&str, &str)> {
        let name = Path::new(path).file_name()?.to_string_lossy();
        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| p.matches(&name)))
            .map(|rule| (rule.name.as_str(), rule.checker.as_str()))
    }

    /// `(language, checker)` pairs for `paths`, in first-seen order, without repeats.
    pub fn detect<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> Vec<(String, String)> {
        let mut found: Vec<(String, String)> = Vec::new();
        for path in paths {
            if let Some((name, checker)) = self.language_of(path) {
                if !found.iter().any(|(n, _)| n == name) {
                    found.push((name.to_string(), checker.to_string()));
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_map() -> LanguageMap {
        LanguageMap::from_config(&ReviewConfig::default())
    }

    #[test]
    fn c_family_extensions_share_one_entry() {
        let found = default_map().detect(["a.c", "b.h", "c.cpp"]);
        assert_eq!(found, vec![("C/C++".to_string(), "pclint".to_string())]);
    }

    #[test]
    fn unknown_extensions_are_ignored() {
        assert!(default_map().detect(["README.md", "sig/x/sig-info.yaml"]).is_empty());
    }

    #[test]
    fn matching_uses_file_name_only() {
        let map = default_map();
        assert_eq!(map.language_of("deep/dir.py/file.txt"), None);
        assert_eq!(map.language_of("deep/dir/file.py"), Some(("Python", "pylint-3")));
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let map = LanguageMap::from_rules(&[LanguageRule {
            name: "Rust".into(),
            checker: "clippy".into(),
            patterns: vec!["[".into(), "*.rs".into()],
        }]);
        assert_eq!(map.language_of("src/lib.rs"), Some(("Rust", "clippy")));
    }
}
