use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of one file in a name-status diff.
///
/// # Examples
///
/// ```
/// use warden_core::ChangeStatus;
///
/// let status: ChangeStatus = "M".parse().unwrap();
/// assert_eq!(status, ChangeStatus::Modified);
/// assert_eq!(status.to_string(), "M");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// New file.
    Added,
    /// Existing file modified.
    Modified,
    /// File removed.
    Deleted,
    /// File moved with identical content (`R100`).
    Renamed,
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeStatus::Added => write!(f, "A"),
            ChangeStatus::Modified => write!(f, "M"),
            ChangeStatus::Deleted => write!(f, "D"),
            ChangeStatus::Renamed => write!(f, "R100"),
        }
    }
}

impl FromStr for ChangeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(ChangeStatus::Added),
            "M" => Ok(ChangeStatus::Modified),
            "D" => Ok(ChangeStatus::Deleted),
            "R100" => Ok(ChangeStatus::Renamed),
            other => Err(format!("unsupported status token: {other}")),
        }
    }
}

/// One changed file between the pull request head and its target branch.
///
/// # Examples
///
/// ```
/// use warden_core::{ChangeEntry, ChangeStatus};
///
/// let entry = ChangeEntry::renamed("sig/a/src-openeuler/p/pkg.yaml", "sig/sig-recycle/src-openeuler/p/pkg.yaml");
/// assert_eq!(entry.status, ChangeStatus::Renamed);
/// assert_eq!(entry.file_name(), "pkg.yaml");
/// assert_eq!(entry.renamed_from.as_deref(), Some("sig/a/src-openeuler/p/pkg.yaml"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// Kind of change.
    pub status: ChangeStatus,
    /// Path relative to the repository root (new path for renames).
    pub path: String,
    /// Original path, set only for renames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
}

impl ChangeEntry {
    /// Build a non-rename entry.
    pub fn new(status: ChangeStatus, path: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
            renamed_from: None,
        }
    }

    /// Build an exact-rename entry.
    pub fn renamed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            status: ChangeStatus::Renamed,
            path: to.into(),
            renamed_from: Some(from.into()),
        }
    }

    /// Path split on `/`.
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').collect()
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.renamed_from {
            Some(from) => write!(f, "{}\t{}\t{}", self.status, from, self.path),
            None => write!(f, "{}\t{}", self.status, self.path),
        }
    }
}

/// Review outcome vocabulary shown in each checklist row.
///
/// # Examples
///
/// ```
/// use warden_core::ReviewStatus;
///
/// let s: ReviewStatus = serde_json::from_str("\"nogo\"").unwrap();
/// assert_eq!(s, ReviewStatus::NoGo);
/// assert_eq!(ReviewStatus::default(), ReviewStatus::Ongoing);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Requirement met.
    Go,
    /// Requirement not met.
    NoGo,
    /// Not applicable.
    Na,
    /// Reviewer has a question.
    Question,
    /// Not reviewed yet.
    #[default]
    Ongoing,
}

impl ReviewStatus {
    /// All statuses in header order.
    pub const ALL: [ReviewStatus; 5] = [
        ReviewStatus::Go,
        ReviewStatus::NoGo,
        ReviewStatus::Na,
        ReviewStatus::Question,
        ReviewStatus::Ongoing,
    ];

    /// Placeholder key used in header templates.
    pub fn key(self) -> &'static str {
        match self {
            ReviewStatus::Go => "go",
            ReviewStatus::NoGo => "nogo",
            ReviewStatus::Na => "na",
            ReviewStatus::Question => "question",
            ReviewStatus::Ongoing => "ongoing",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Output format for CLI subcommands.
///
/// # Examples
///
/// ```
/// use warden_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_only_accepts_exact_token() {
        assert_eq!("R100".parse::<ChangeStatus>(), Ok(ChangeStatus::Renamed));
        assert!("R097".parse::<ChangeStatus>().is_err());
        assert!("C100".parse::<ChangeStatus>().is_err());
    }

    #[test]
    fn entry_display_uses_tabs() {
        let entry = ChangeEntry::new(ChangeStatus::Deleted, "sig/x/src-openeuler/pkg.yaml");
        assert_eq!(entry.to_string(), "D\tsig/x/src-openeuler/pkg.yaml");

        let renamed = ChangeEntry::renamed("a.yaml", "b.yaml");
        assert_eq!(renamed.to_string(), "R100\ta.yaml\tb.yaml");
    }

    #[test]
    fn entry_segments_and_file_name() {
        let entry = ChangeEntry::new(ChangeStatus::Added, "sig/new-sig/openeuler/foo.yaml");
        assert_eq!(entry.segments(), vec!["sig", "new-sig", "openeuler", "foo.yaml"]);
        assert_eq!(entry.file_name(), "foo.yaml");

        let flat = ChangeEntry::new(ChangeStatus::Added, "README.md");
        assert_eq!(flat.file_name(), "README.md");
    }

    #[test]
    fn entry_serializes_camel_case() {
        let entry = ChangeEntry::renamed("old.yaml", "new.yaml");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["renamedFrom"], "old.yaml");
        assert_eq!(json["status"], "renamed");
    }

    #[test]
    fn review_status_keys_cover_header() {
        let keys: Vec<_> = ReviewStatus::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["go", "nogo", "na", "question", "ongoing"]);
    }
}
