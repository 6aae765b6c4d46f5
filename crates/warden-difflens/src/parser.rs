//! Parsers for `git diff --name-status` output and single-file unified diffs.

use std::fmt;

use tracing::warn;
use warden_core::{ChangeEntry, ChangeStatus};

/// One body line of a single-file unified diff.
///
/// # Examples
///
/// ```
/// use warden_difflens::parser::DiffLine;
///
/// let line = DiffLine::Added("Version: 1.1".into());
/// assert_eq!(line.to_string(), "+Version: 1.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    /// Line present only in the pull request (`+`).
    Added(String),
    /// Line present only on the target branch (`-`).
    Removed(String),
    /// Unchanged context line.
    Context(String),
}

impl DiffLine {
    /// Line text without its prefix.
    pub fn text(&self) -> &str {
        match self {
            DiffLine::Added(t) | DiffLine::Removed(t) | DiffLine::Context(t) => t,
        }
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffLine::Added(t) => write!(f, "+{t}"),
            DiffLine::Removed(t) => write!(f, "-{t}"),
            DiffLine::Context(t) => write!(f, " {t}"),
        }
    }
}

/// Parse name-status output into [`ChangeEntry`] records.
///
/// Fields are tab-separated as git prints them; whitespace-separated lines are
/// accepted too. Only an exact rename (`R100`) may carry two paths. Lines that
/// cannot be understood are skipped with a warning rather than failing the
/// whole listing.
///
/// # Examples
///
/// ```
/// use warden_core::ChangeStatus;
/// use warden_difflens::parser::parse_name_status;
///
/// let entries = parse_name_status("M\tsig/sig-storage/sig-info.yaml\nR100\ta.yaml\tb.yaml\n");
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].status, ChangeStatus::Modified);
/// assert_eq!(entries[1].renamed_from.as_deref(), Some("a.yaml"));
/// ```
pub fn parse_name_status(input: &str) -> Vec<ChangeEntry> {
    input
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match parse_name_status_line(line) {
            Ok(entry) => entry,
            Err(reason) => {
                warn!(line = idx + 1, content = line, "skipping name-status line: {reason}");
                None
            }
        })
        .collect()
}

/// Parse a single name-status line. Blank lines yield `Ok(None)`.
fn parse_name_status_line(line: &str) -> Result<Option<ChangeEntry>, String> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').filter(|f| !f.is_empty()).collect()
    } else {
        line.split_whitespace().collect()
    };

    match fields.as_slice() {
        ["R100", from, to] => Ok(Some(ChangeEntry::renamed(*from, *to))),
        [status, _, _] => Err(format!("status '{status}' cannot carry two paths")),
        [status, path] => {
            let status: ChangeStatus = status.parse()?;
            if status == ChangeStatus::Renamed {
                return Err("rename is missing its destination path".into());
            }
            Ok(Some(ChangeEntry::new(status, *path)))
        }
        [status] => Err(format!("status '{status}' has no path")),
        _ => Err(format!("expected 2 or 3 fields, found {}", fields.len())),
    }
}

/// Parse a unified diff of one file into its body lines.
///
/// File headers, hunk headers and `\ No newline at end of file` markers are
/// dropped; everything else keeps its `+`/`-`/context classification.
///
/// # Examples
///
/// ```
/// use warden_difflens::parser::{parse_file_diff, DiffLine};
///
/// let diff = "\
/// diff --git a/pkg.spec b/pkg.spec
/// --- a/pkg.spec
/// +++ b/pkg.spec
/// @@ -1,2 +1,2 @@
///  Name: pkg
/// -Version: 1.0
/// +Version: 1.1
/// ";
/// let lines = parse_file_diff(diff);
/// assert_eq!(lines.len(), 3);
/// assert_eq!(lines[2], DiffLine::Added("Version: 1.1".into()));
/// ```
pub fn parse_file_diff(input: &str) -> Vec<DiffLine> {
    let mut lines = Vec::new();
    let mut in_hunk = false;

    for line in input.lines() {
        if line.starts_with("diff --git ") {
            in_hunk = false;
            continue;
        }

        if line.starts_with("@@ ") {
            in_hunk = true;
            continue;
        }

        if !in_hunk {
            // Header area: index, mode, ---/+++ lines.
            continue;
        }

        if line == "\\ No newline at end of file" {
            continue;
        }

        if let Some(rest) = line.strip_prefix('+') {
            lines.push(DiffLine::Added(rest.to_string()));
        } else if let Some(rest) = line.strip_prefix('-') {
            lines.push(DiffLine::Removed(rest.to_string()));
        } else if let Some(rest) = line.strip_prefix(' ') {
            lines.push(DiffLine::Context(rest.to_string()));
        } else if line.is_empty() {
            lines.push(DiffLine::Context(String::new()));
        }
    }

    lines
}
