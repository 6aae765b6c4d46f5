use tracing::debug;
use warden_core::{ChangeEntry, WardenError};

use crate::parser::{parse_file_diff, parse_name_status, DiffLine};
use crate::source::{ChangeFilter, DiffSource};

/// Structured view over a [`DiffSource`].
///
/// # Examples
///
/// ```
/// use warden_difflens::reader::DiffReader;
/// use warden_difflens::source::{ChangeFilter, StaticDiff};
///
/// let reader = DiffReader::new(StaticDiff::new("A\tsig/new-sig/openeuler/foo.yaml\n"));
/// let changes = reader.list_changed_files("master", ChangeFilter::All).unwrap();
/// assert_eq!(changes.len(), 1);
/// ```
pub struct DiffReader<S> {
    source: S,
}

impl<S: DiffSource> DiffReader<S> {
    /// Wrap a diff source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Every file changed between `target_branch` and the pull request head.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::DiffUnavailable`] if the diff could not be
    /// produced. An empty `Vec` always means "no changes".
    pub fn list_changed_files(
        &self,
        target_branch: &str,
        filter: ChangeFilter,
    ) -> Result<Vec<ChangeEntry>, WardenError> {
        let raw = self.source.name_status(target_branch, filter)?;
        let entries = parse_name_status(&raw);
        debug!(target_branch, ?filter, count = entries.len(), "listed changed files");
        Ok(entries)
    }

    /// Body lines of the diff of one changed file.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::DiffUnavailable`] if the diff could not be produced.
    pub fn file_diff(&self, target_branch: &str, path: &str) -> Result<Vec<DiffLine>, WardenError> {
        let raw = self.source.unified(target_branch, path)?;
        Ok(parse_file_diff(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticDiff;
    use warden_core::ChangeStatus;

    #[test]
    fn unavailable_is_not_empty() {
        let reader = DiffReader::new(StaticDiff::unavailable());
        let result = reader.list_changed_files("master", ChangeFilter::All);
        assert!(matches!(result, Err(WardenError::DiffUnavailable(_))));
    }

    #[test]
    fn filtered_listing() {
        let reader = DiffReader::new(StaticDiff::new("A\tnew.c\nM\tpkg.spec\nD\told.go\n"));
        let modified = reader.list_changed_files("master", ChangeFilter::Modified).unwrap();
        assert_eq!(modified, vec![ChangeEntry::new(ChangeStatus::Modified, "pkg.spec")]);
    }

    #[test]
    fn file_diff_is_parsed() {
        let reader = DiffReader::new(
            StaticDiff::new("M\tpkg.spec\n")
                .with_file("pkg.spec", "@@ -1 +1 @@\n-Version: 1.0\n+Version: 1.1\n"),
        );
        let lines = reader.file_diff("master", "pkg.spec").unwrap();
        assert_eq!(
            lines,
            vec![
                DiffLine::Removed("Version: 1.0".into()),
                DiffLine::Added("Version: 1.1".into()),
            ]
        );
    }
}
