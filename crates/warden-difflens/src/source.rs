//! Where raw diff text comes from.
//!
//! [`GitDiff`] shells out to `git` against a materialized working copy;
//! tests substitute [`StaticDiff`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use warden_core::WardenError;

/// Restricts a name-status listing to one kind of change.
///
/// # Examples
///
/// ```
/// use warden_difflens::source::ChangeFilter;
///
/// assert_eq!(ChangeFilter::Added.git_flag(), Some("--diff-filter=A"));
/// assert_eq!(ChangeFilter::All.git_flag(), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangeFilter {
    /// Every change.
    #[default]
    All,
    /// Added files only.
    Added,
    /// Modified files only.
    Modified,
    /// Deleted files only.
    Deleted,
}

impl ChangeFilter {
    /// The `git diff` flag for this filter.
    pub fn git_flag(self) -> Option<&'static str> {
        match self {
            ChangeFilter::All => None,
            ChangeFilter::Added => Some("--diff-filter=A"),
            ChangeFilter::Modified => Some("--diff-filter=M"),
            ChangeFilter::Deleted => Some("--diff-filter=D"),
        }
    }
}

/// Produces raw diff text between the working copy and a target branch.
pub trait DiffSource {
    /// Name-status listing (`<status>\t<path>` per line).
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::DiffUnavailable`] when the diff cannot be produced.
    fn name_status(&self, target_branch: &str, filter: ChangeFilter) -> Result<String, WardenError>;

    /// Unified diff of a single path.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::DiffUnavailable`] when the diff cannot be produced.
    fn unified(&self, target_branch: &str, path: &str) -> Result<String, WardenError>;
}

/// Runs `git diff` in a working copy whose HEAD is the pull request.
///
/// Only exact renames are reported as renames (`--find-renames=100%`); any
/// other move shows up as a delete plus an add.
#[derive(Debug, Clone)]
pub struct GitDiff {
    root: PathBuf,
}

impl GitDiff {
    /// Create a source for the working copy at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Working copy root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, args: &[&str]) -> Result<String, WardenError> {
        debug!(root = %self.root.display(), ?args, "running git");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| WardenError::DiffUnavailable(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WardenError::DiffUnavailable(format!(
                "git {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DiffSource for GitDiff {
    fn name_status(&self, target_branch: &str, filter: ChangeFilter) -> Result<String, WardenError> {
        let range = format!("{target_branch}...HEAD");
        let mut args = vec!["diff", "--find-renames=100%", "--name-status"];
        if let Some(flag) = filter.git_flag() {
            args.push(flag);
        }
        args.push(range.as_str());
        self.run(&args)
    }

    fn unified(&self, target_branch: &str, path: &str) -> Result<String, WardenError> {
        let range = format!("{target_branch}...HEAD");
        self.run(&["diff", range.as_str(), "--", path])
    }
}

/// A canned diff source.
///
/// Holds a fixed name-status listing and per-path unified diffs. Paths listed
/// in `failing` report [`WardenError::DiffUnavailable`], as does the listing
/// itself when `listing` is `None`.
///
/// # Examples
///
/// ```
/// use warden_difflens::source::{ChangeFilter, DiffSource, StaticDiff};
///
/// let source = StaticDiff::new("A\tnew.yaml\nM\told.yaml\n");
/// let added = source.name_status("master", ChangeFilter::Added).unwrap();
/// assert_eq!(added.trim(), "A\tnew.yaml");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticDiff {
    listing: Option<String>,
    files: BTreeMap<String, String>,
    failing: Vec<String>,
}

impl StaticDiff {
    /// Source whose listing is `name_status`.
    pub fn new(name_status: impl Into<String>) -> Self {
        Self {
            listing: Some(name_status.into()),
            ..Self::default()
        }
    }

    /// Source whose every call fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Register the unified diff for `path`.
    pub fn with_file(mut self, path: impl Into<String>, diff: impl Into<String>) -> Self {
        self.files.insert(path.into(), diff.into());
        self
    }

    /// Make diffs of `path` fail.
    pub fn with_failing_file(mut self, path: impl Into<String>) -> Self {
        self.failing.push(path.into());
        self
    }
}

impl DiffSource for StaticDiff {
    fn name_status(&self, _target_branch: &str, filter: ChangeFilter) -> Result<String, WardenError> {
        let listing = self
            .listing
            .as_ref()
            .ok_or_else(|| WardenError::DiffUnavailable("no listing configured".into()))?;

        let prefix = match filter {
            ChangeFilter::All => return Ok(listing.clone()),
            ChangeFilter::Added => "A",
            ChangeFilter::Modified => "M",
            ChangeFilter::Deleted => "D",
        };
        let kept: Vec<&str> = listing
            .lines()
            .filter(|line| {
                line.split(|c: char| c.is_whitespace())
                    .next()
                    .is_some_and(|status| status == prefix)
            })
            .collect();
        Ok(kept.iter().map(|l| format!("{l}\n")).collect())
    }

    fn unified(&self, _target_branch: &str, path: &str) -> Result<String, WardenError> {
        if self.listing.is_none() || self.failing.iter().any(|p| p == path) {
            return Err(WardenError::DiffUnavailable(format!("diff of {path} failed")));
        }
        Ok(self.files.get(path).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_flags() {
        assert_eq!(ChangeFilter::Modified.git_flag(), Some("--diff-filter=M"));
        assert_eq!(ChangeFilter::Deleted.git_flag(), Some("--diff-filter=D"));
    }

    #[test]
    fn static_source_filters_by_status() {
        let source = StaticDiff::new("A\ta.yaml\nM\tb.yaml\nD\tc.yaml\nR100\td.yaml\te.yaml\n");
        assert_eq!(source.name_status("master", ChangeFilter::Deleted).unwrap(), "D\tc.yaml\n");
        assert_eq!(
            source.name_status("master", ChangeFilter::All).unwrap().lines().count(),
            4
        );
    }

    #[test]
    fn unavailable_source_fails_everything() {
        let source = StaticDiff::unavailable();
        assert!(matches!(
            source.name_status("master", ChangeFilter::All),
            Err(WardenError::DiffUnavailable(_))
        ));
        assert!(source.unified("master", "x.spec").is_err());
    }

    #[test]
    fn failing_file_is_reported() {
        let source = StaticDiff::new("M\tx.spec\n").with_failing_file("x.spec");
        assert!(matches!(
            source.unified("master", "x.spec"),
            Err(WardenError::DiffUnavailable(_))
        ));
    }

    #[test]
    fn git_source_outside_repository_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = GitDiff::new(dir.path());
        let result = source.name_status("master", ChangeFilter::All);
        assert!(matches!(result, Err(WardenError::DiffUnavailable(_))));
    }
}
