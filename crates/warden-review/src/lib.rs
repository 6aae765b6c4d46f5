//! Review checklist rendering and the comment lifecycle.
//!
//! Builds the checklist from a template and the governance facts, renders
//! it under a localized header, and keeps exactly one checklist comment
//! alive on the pull request through the GitCode API.

pub mod checklist;
pub mod comment;
pub mod gitcode;
pub mod header;
pub mod pipeline;
pub mod placeholder;
pub mod template;

pub use checklist::{Checklist, ChecklistBuilder, ChecklistContext, ChecklistRow, RowSequence};
pub use comment::{reconcile, CommentLifecycle, PullComment};
pub use gitcode::{GitCodeClient, PullRequest, PullRequestApi};
pub use header::Locale;
pub use pipeline::{evaluate, GitWorkspace, ReviewPipeline, ReviewReport, Workspace};
pub use template::{ChecklistTemplate, Condition};
