use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WardenError;
use crate::types::ReviewStatus;

/// Top-level configuration loaded from `.warden.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use warden_core::WardenConfig;
///
/// let config = WardenConfig::default();
/// assert_eq!(config.git.default_branch, "master");
/// assert_eq!(config.review.wait_confirm_label, "wait_confirm");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Working-copy settings.
    #[serde(default)]
    pub git: GitConfig,
    /// Checklist rendering settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Comment/label REST API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

impl WardenConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// Relative template paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Io`] if the file cannot be read, or
    /// [`WardenError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, WardenError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        if let Some(dir) = path.parent() {
            config.review.resolve_templates(dir);
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::WardenConfig;
    ///
    /// let toml = r#"
    /// [git]
    /// default_branch = "main"
    /// "#;
    /// let config = WardenConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.git.default_branch, "main");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, WardenError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the API token: explicit value first, then `GITCODE_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Config`] if neither is set.
    pub fn api_token(&self) -> Result<String, WardenError> {
        if let Some(token) = &self.api.token {
            return Ok(token.clone());
        }
        std::env::var("GITCODE_TOKEN").map_err(|_| {
            WardenError::Config(
                "GITCODE_TOKEN not set. Set [api].token in .warden.toml or export GITCODE_TOKEN"
                    .into(),
            )
        })
    }
}

/// Working-copy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// The default integration branch (default: `"master"`).
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "master".into()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
        }
    }
}

/// Checklist rendering configuration.
///
/// # Examples
///
/// ```
/// use warden_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.languages.len(), 3);
/// assert!(config.consensus_markers.iter().any(|m| m == "approved by all members"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Chinese checklist template.
    #[serde(default = "default_template_zh")]
    pub template_zh: PathBuf,
    /// English checklist template.
    #[serde(default = "default_template_en")]
    pub template_en: PathBuf,
    /// Label attached when the checklist asks for sign-off from everyone.
    #[serde(default = "default_wait_confirm_label")]
    pub wait_confirm_label: String,
    /// Phrases in the rendered checklist that trigger the label.
    #[serde(default = "default_consensus_markers")]
    pub consensus_markers: Vec<String>,
    /// Extension-to-checker table for the static-check item.
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageRule>,
    /// Display tokens for the status vocabulary.
    #[serde(default)]
    pub status: StatusTokens,
}

fn default_template_zh() -> PathBuf {
    PathBuf::from("config/reviewer_checklist_zh.yaml")
}

fn default_template_en() -> PathBuf {
    PathBuf::from("config/reviewer_checklist_en.yaml")
}

fn default_wait_confirm_label() -> String {
    "wait_confirm".into()
}

fn default_consensus_markers() -> Vec<String> {
    vec!["等所有人".into(), "approved by all members".into()]
}

fn default_languages() -> Vec<LanguageRule> {
    vec![
        LanguageRule {
            name: "Python".into(),
            checker: "pylint-3".into(),
            patterns: vec!["*.py".into()],
        },
        LanguageRule {
            name: "GO".into(),
            checker: "golint".into(),
            patterns: vec!["*.go".into()],
        },
        LanguageRule {
            name: "C/C++".into(),
            checker: "pclint".into(),
            patterns: vec!["*.c".into(), "*.cpp".into(), "*.h".into()],
        },
    ]
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            template_zh: default_template_zh(),
            template_en: default_template_en(),
            wait_confirm_label: default_wait_confirm_label(),
            consensus_markers: default_consensus_markers(),
            languages: default_languages(),
            status: StatusTokens::default(),
        }
    }
}

impl ReviewConfig {
    /// Anchor relative template paths at `dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use warden_core::ReviewConfig;
    ///
    /// let mut config = ReviewConfig::default();
    /// config.template_en = PathBuf::from("/etc/warden/en.yaml");
    /// config.resolve_templates(Path::new("/srv/community"));
    /// assert_eq!(config.template_zh, Path::new("/srv/community/config/reviewer_checklist_zh.yaml"));
    /// assert_eq!(config.template_en, Path::new("/etc/warden/en.yaml"));
    /// ```
    pub fn resolve_templates(&mut self, dir: &Path) {
        for template in [&mut self.template_zh, &mut self.template_en] {
            if template.is_relative() {
                *template = dir.join(&*template);
            }
        }
    }

    /// Display token for `status`, falling back to its key.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::{ReviewConfig, ReviewStatus};
    ///
    /// let mut config = ReviewConfig::default();
    /// assert_eq!(config.status_token(ReviewStatus::Go), "go");
    /// config.status.go = Some(":white_check_mark:".into());
    /// assert_eq!(config.status_token(ReviewStatus::Go), ":white_check_mark:");
    /// ```
    pub fn status_token(&self, status: ReviewStatus) -> &str {
        let token = match status {
            ReviewStatus::Go => &self.status.go,
            ReviewStatus::NoGo => &self.status.nogo,
            ReviewStatus::Na => &self.status.na,
            ReviewStatus::Question => &self.status.question,
            ReviewStatus::Ongoing => &self.status.ongoing,
        };
        token.as_deref().unwrap_or_else(|| status.key())
    }
}

/// Overrides for the status vocabulary; unset entries render as their key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusTokens {
    pub go: Option<String>,
    pub nogo: Option<String>,
    pub na: Option<String>,
    pub question: Option<String>,
    pub ongoing: Option<String>,
}

/// One language the static-check item can name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRule {
    /// Language label, e.g. `"Python"`.
    pub name: String,
    /// Checker label, e.g. `"pylint-3"`.
    pub checker: String,
    /// Glob patterns matched against changed paths.
    pub patterns: Vec<String>,
}

/// REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root (default: `https://api.gitcode.com/api/v5`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Access token; `GITCODE_TOKEN` is used when absent.
    pub token: Option<String>,
    /// Page size when listing comments (default: 10).
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_base_url() -> String {
    "https://api.gitcode.com/api/v5".into()
}

fn default_per_page() -> u32 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            per_page: default_per_page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = WardenConfig::default();
        assert_eq!(config.git.default_branch, "master");
        assert_eq!(
            config.review.template_en,
            PathBuf::from("config/reviewer_checklist_en.yaml")
        );
        assert_eq!(config.review.consensus_markers.len(), 2);
        assert_eq!(config.api.base_url, "https://api.gitcode.com/api/v5");
        assert_eq!(config.api.per_page, 10);
        assert!(config.api.token.is_none());
        assert_eq!(config.review.status, StatusTokens::default());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = WardenConfig::from_toml("").unwrap();
        assert_eq!(config.git.default_branch, "master");
        assert_eq!(config.review.languages.len(), 3);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[git]
default_branch = "main"

[review]
template_en = "templates/en.yaml"
wait_confirm_label = "needs-consensus"
consensus_markers = ["all maintainers must approve"]

[[review.languages]]
name = "Rust"
checker = "clippy"
patterns = ["*.rs"]

[review.status]
go = ":white_check_mark:"
nogo = ":x:"

[api]
base_url = "https://gitcode.example/api/v5"
token = "t0ken"
per_page = 50
"#;
        let config = WardenConfig::from_toml(toml).unwrap();
        assert_eq!(config.git.default_branch, "main");
        assert_eq!(config.review.template_en, PathBuf::from("templates/en.yaml"));
        assert_eq!(
            config.review.template_zh,
            PathBuf::from("config/reviewer_checklist_zh.yaml")
        );
        assert_eq!(config.review.wait_confirm_label, "needs-consensus");
        assert_eq!(config.review.languages.len(), 1);
        assert_eq!(config.review.languages[0].checker, "clippy");
        assert_eq!(config.review.status_token(ReviewStatus::NoGo), ":x:");
        assert_eq!(config.review.status_token(ReviewStatus::Na), "na");
        assert_eq!(config.api.per_page, 50);
        assert_eq!(config.api_token().unwrap(), "t0ken");
    }

    #[test]
    fn templates_resolve_next_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".warden.toml");
        std::fs::write(&path, "[review]\ntemplate_en = \"checklists/en.yaml\"\n").unwrap();

        let config = WardenConfig::from_file(&path).unwrap();
        assert_eq!(config.review.template_en, dir.path().join("checklists/en.yaml"));
        assert_eq!(
            config.review.template_zh,
            dir.path().join("config/reviewer_checklist_zh.yaml")
        );
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = WardenConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(WardenError::Toml(_))));
    }

    #[test]
    fn unknown_status_key_is_rejected() {
        let toml = r#"
[review.status]
maybe = "?"
"#;
        assert!(WardenConfig::from_toml(toml).is_err());
    }
}
