use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};
use warden_core::{ChangeEntry, ChangeStatus, WardenConfig, WardenError};
use warden_difflens::fields::field_changed;
use warden_difflens::languages::LanguageMap;
use warden_difflens::parser::DiffLine;
use warden_difflens::{ChangeFilter, DiffReader, DiffSource, GitDiff};
use warden_governance::{FactSet, GitCheckout, GovernanceStore, RuleEngine, WorkingCopyStore};

use crate::checklist::{ChecklistBuilder, ChecklistContext, DiffEvidence, RenderWarning};
use crate::comment::{reconcile, CommentLifecycle};
use crate::gitcode::{PullRequest, PullRequestApi};
use crate::header::Locale;
use crate::template::ChecklistTemplate;

/// A materialized pull request: where diffs and records come from.
pub trait Workspace {
    type Diff: DiffSource;
    type Store: GovernanceStore;

    fn diff_source(&self) -> Self::Diff;

    /// Record store whose baseline is `target_branch`.
    fn store(&self, target_branch: &str) -> Self::Store;
}

/// A git working copy with the pull request head checked out.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    root: PathBuf,
}

impl GitWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Workspace for GitWorkspace {
    type Diff = GitDiff;
    type Store = WorkingCopyStore<GitCheckout>;

    fn diff_source(&self) -> GitDiff {
        GitDiff::new(self.root.clone())
    }

    fn store(&self, target_branch: &str) -> Self::Store {
        WorkingCopyStore::new(
            self.root.clone(),
            target_branch,
            GitCheckout::new(self.root.clone()),
        )
    }
}

/// Diff evidence and governance facts of one pull request.
///
/// Both are `None` when the changed-file listing was unavailable.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub evidence: Option<DiffEvidence>,
    pub facts: Option<FactSet>,
}

/// Gather diff evidence and run the governance rules.
///
/// # Errors
///
/// Store failures are returned; an unavailable diff is not an error.
pub fn evaluate<W: Workspace>(
    workspace: &W,
    config: &WardenConfig,
    target_branch: &str,
    author: &str,
) -> Result<Evaluation, WardenError> {
    let reader = DiffReader::new(workspace.diff_source());
    let changes = match reader.list_changed_files(target_branch, ChangeFilter::All) {
        Ok(changes) => changes,
        Err(e @ WardenError::DiffUnavailable(_)) => {
            warn!("changed files undetermined, diff-based items are left out: {e}");
            return Ok(Evaluation::default());
        }
        Err(e) => return Err(e),
    };

    let languages =
        LanguageMap::from_config(&config.review).detect(changes.iter().map(|c| c.path.as_str()));
    let spec_diffs = spec_diffs(&reader, target_branch, &changes);
    let spec_field = |keyword: &str| {
        spec_diffs
            .as_ref()
            .map(|diffs| diffs.iter().any(|lines| field_changed(lines, keyword)))
    };
    let license_changed = spec_field("License");
    let version_changed = spec_field("Version");

    let facts = RuleEngine::new(workspace.store(target_branch), author).evaluate(&changes)?;

    Ok(Evaluation {
        evidence: Some(DiffEvidence {
            changes,
            languages,
            license_changed,
            version_changed,
        }),
        facts: Some(facts),
    })
}

/// Diffs of every modified `.spec` file, or `None` if any is unavailable.
fn spec_diffs<S: DiffSource>(
    reader: &DiffReader<S>,
    target_branch: &str,
    changes: &[ChangeEntry],
) -> Option<Vec<Vec<DiffLine>>> {
    let mut diffs = Vec::new();
    for entry in changes
        .iter()
        .filter(|c| c.status == ChangeStatus::Modified && c.path.ends_with(".spec"))
    {
        match reader.file_diff(target_branch, &entry.path) {
            Ok(lines) => diffs.push(lines),
            Err(e) => {
                warn!(path = %entry.path, "spec diff undetermined: {e}");
                return None;
            }
        }
    }
    Some(diffs)
}

/// What a review run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// A checklist was rendered.
    Checklist,
    /// The pull request has conflicts; a notice was rendered instead.
    Conflict,
}

/// Result of a completed review run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub outcome: Outcome,
    /// Full comment text.
    pub comment: String,
    pub rows: usize,
    /// Rows dropped because they failed to render.
    pub warnings: Vec<RenderWarning>,
    /// Whether the comment was posted.
    pub posted: bool,
    /// Superseded checklist comments that were deleted.
    pub deleted: Vec<u64>,
    /// Label that applies (added when posting).
    pub label: Option<String>,
}

/// Review orchestrator for one repository.
///
/// Fetches the pull request, renders the checklist, posts it, deletes the
/// checklists it supersedes and applies the sign-off label. Without posting
/// enabled, nothing is written to the API.
pub struct ReviewPipeline<A: PullRequestApi> {
    api: A,
    config: WardenConfig,
    owner: String,
    repo: String,
    post: bool,
}

impl<A: PullRequestApi> ReviewPipeline<A> {
    /// Create a dry-run pipeline for `owner/repo`.
    pub fn new(api: A, config: WardenConfig, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api,
            config,
            owner: owner.into(),
            repo: repo.into(),
            post: false,
        }
    }

    /// Enable or disable API writes.
    pub fn posting(mut self, post: bool) -> Self {
        self.post = post;
        self
    }

    /// Review pull request `number` using `workspace`.
    ///
    /// `target_override` replaces the target branch reported by the API.
    ///
    /// # Errors
    ///
    /// Returns API errors, and evaluation errors after the failure notice has
    /// been posted.
    pub async fn run<W: Workspace>(
        &self,
        number: u64,
        workspace: &W,
        target_override: Option<&str>,
    ) -> Result<ReviewReport, WardenError> {
        let pr = self.api.pull_request(number).await?;
        let locale = Locale::detect(&pr.title, pr.body.as_deref().unwrap_or_default());

        if pr.mergeable.is_none() {
            warn!(pr = number, "mergeability not computed yet, treating as mergeable");
        }
        if pr.has_conflict() {
            info!(pr = number, "pull request has conflicts");
            let comment = locale.conflict_notice(pr.author());
            self.publish(number, &comment).await?;
            return Ok(ReviewReport {
                outcome: Outcome::Conflict,
                comment,
                rows: 0,
                warnings: Vec::new(),
                posted: self.post,
                deleted: Vec::new(),
                label: None,
            });
        }

        let (comment, rows, warnings) = match self.render(&pr, locale, workspace, target_override) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!(pr = number, "evaluation aborted: {e}");
                if let Err(post_err) = self.publish(number, locale.failure_notice()).await {
                    error!(pr = number, "failed to post failure notice: {post_err}");
                }
                return Err(e);
            }
        };

        self.publish(number, &comment).await?;

        let mut deleted = Vec::new();
        if self.post {
            let existing = self.api.list_comments(number).await?;
            for id in reconcile(&existing, &locale.fingerprint()) {
                self.api.delete_comment(id).await?;
                deleted.push(id);
            }
        }

        let lifecycle = CommentLifecycle::from_config(&self.config.review);
        let existing_labels = self.api.list_labels(number).await?;
        let label = lifecycle
            .label_if_needed(&comment, &existing_labels)
            .map(str::to_string);
        if let (true, Some(label)) = (self.post, &label) {
            self.api.add_labels(number, std::slice::from_ref(label)).await?;
        }

        info!(pr = number, rows, deleted = deleted.len(), ?label, "review finished");
        Ok(ReviewReport {
            outcome: Outcome::Checklist,
            comment,
            rows,
            warnings,
            posted: self.post,
            deleted,
            label,
        })
    }

    fn render<W: Workspace>(
        &self,
        pr: &PullRequest,
        locale: Locale,
        workspace: &W,
        target_override: Option<&str>,
    ) -> Result<(String, usize, Vec<RenderWarning>), WardenError> {
        let target = target_override
            .or(pr.target_branch())
            .ok_or_else(|| WardenError::Config("pull request has no target branch".into()))?;

        let evaluation = evaluate(workspace, &self.config, target, pr.author())?;
        let template = ChecklistTemplate::from_file(locale.template_path(&self.config.review))?;
        let context = ChecklistContext {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            target_branch: target.to_string(),
            evidence: evaluation.evidence,
        };
        let checklist = ChecklistBuilder::new(self.config.git.default_branch.as_str()).build(
            &template,
            evaluation.facts.as_ref(),
            &context,
        );

        let mut comment = locale.header(&self.config.review)?;
        comment.push_str(&checklist.render_rows(&self.config.review));
        Ok((comment, checklist.rows.len(), checklist.warnings))
    }

    async fn publish(&self, number: u64, body: &str) -> Result<(), WardenError> {
        if self.post {
            self.api.create_comment(number, body).await
        } else {
            Ok(())
        }
    }
}
