//! Detects a changed `Key: value` header field in a package spec diff.

use crate::parser::DiffLine;

/// Whether `keyword` changed value in `lines`.
///
/// Exactly two changed lines must start with `keyword`; any other count is
/// reported as no change. The value is the text between the first and second
/// `:` of the line, trimmed.
///
/// # Examples
///
/// ```
/// use warden_difflens::fields::field_changed;
/// use warden_difflens::parser::DiffLine;
///
/// let lines = vec![
///     DiffLine::Removed("Version: 1.0".into()),
///     DiffLine::Added("Version: 1.1".into()),
/// ];
/// assert!(field_changed(&lines, "Version"));
/// assert!(!field_changed(&lines[1..], "Version"));
/// ```
pub fn field_changed(lines: &[DiffLine], keyword: &str) -> bool {
    let matching: Vec<&DiffLine> = lines
        .iter()
        .filter(|line| match line {
            DiffLine::Added(t) | DiffLine::Removed(t) => t.starts_with(keyword),
            DiffLine::Context(_) => false,
        })
        .collect();

    if matching.len() != 2 {
        return false;
    }

    let prefix = format!("{keyword}:");
    let mut current = "";
    let mut previous = "";
    for line in matching {
        match line {
            DiffLine::Added(t) if t.starts_with(&prefix) => current = field_value(t),
            DiffLine::Removed(t) if t.starts_with(&prefix) => previous = field_value(t),
            _ => {}
        }
    }

    current != previous
}

fn field_value(line: &str) -> &str {
    line.split(':').nth(1).unwrap_or("").trim()
}
