//! Diff reading for pull-request evaluation.
//!
//! Lists the files a pull request changes relative to its target branch,
//! reads single-file diffs, and derives the small diff facts the checklist
//! needs: spec header field changes and the languages touched.

pub mod fields;
pub mod languages;
pub mod parser;
pub mod reader;
pub mod source;

pub use reader::DiffReader;
pub use source::{ChangeFilter, DiffSource, GitDiff, StaticDiff};
