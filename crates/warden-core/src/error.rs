use std::path::PathBuf;

/// Errors that can occur while evaluating a pull request.
///
/// Library crates use this type directly; the binary crate converts to
/// `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use warden_core::WardenError;
///
/// let err = WardenError::Config("missing access token".into());
/// assert!(err.to_string().contains("missing access token"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum WardenError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(warden::config))]
    Config(String),

    /// Git operation failure other than diffing or restoring.
    #[error("git error: {0}")]
    Git(String),

    /// Malformed input that could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The diff tool failed. Callers treat the affected check as undetermined,
    /// never as "nothing changed".
    #[error("diff unavailable: {0}")]
    #[diagnostic(code(warden::diff_unavailable))]
    DiffUnavailable(String),

    /// The working copy could not be switched back after a baseline read.
    ///
    /// Every later read would see the wrong revision, so the run must abort.
    #[error("failed to restore working copy to '{rev}': {reason}")]
    #[diagnostic(
        code(warden::restore_failure),
        help("the working copy is left on the wrong revision; discard it before the next run")
    )]
    RestoreFailure {
        /// The revision the working copy should have returned to.
        rev: String,
        /// Underlying failure.
        reason: String,
    },

    /// A checklist row referenced a placeholder with no value.
    #[error("template render error: no value for placeholder '{{{placeholder}}}'")]
    TemplateRender {
        /// Name of the unresolved placeholder.
        placeholder: String,
    },

    /// REST API failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML deserialization failure.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl WardenError {
    /// Returns `true` for errors after which no further reads can be trusted.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::WardenError;
    ///
    /// let err = WardenError::RestoreFailure { rev: "tmp_pr_1".into(), reason: "locked".into() };
    /// assert!(err.is_fatal());
    /// assert!(!WardenError::DiffUnavailable("exit 128".into()).is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(self, WardenError::RestoreFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WardenError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = WardenError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn template_render_names_placeholder() {
        let err = WardenError::TemplateRender {
            placeholder: "sig".into(),
        };
        assert_eq!(
            err.to_string(),
            "template render error: no value for placeholder '{sig}'"
        );
    }

    #[test]
    fn restore_failure_shows_revision() {
        let err = WardenError::RestoreFailure {
            rev: "tmp_pr_7".into(),
            reason: "index.lock exists".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tmp_pr_7"));
        assert!(msg.contains("index.lock"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = WardenError::FileNotFound(PathBuf::from("/tmp/missing.yaml"));
        assert!(err.to_string().contains("/tmp/missing.yaml"));
    }
}
