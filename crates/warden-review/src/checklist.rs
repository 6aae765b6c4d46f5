//! Checklist construction: template items plus facts, in template order.

use serde::Serialize;
use tracing::{debug, warn};
use warden_core::{ChangeEntry, ChangeStatus, ReviewConfig, ReviewStatus};
use warden_governance::FactSet;

use crate::placeholder::{fill, Vars};
use crate::template::{ChecklistItemSpec, ChecklistTemplate, Condition, Group};

/// Item name of the static-check row under `code-modified`.
pub const STATIC_CHECK: &str = "static-check";
/// Item name of the generic maintainer-change notice.
pub const MAINTAINER_NOTICE: &str = "maintainer-add-explain";
/// Item name excluded on the default integration branch.
pub const LATEST_VERSION: &str = "PR-latest-version";

/// Hands out row ids: `0, 1, 2, ...` for one run.
///
/// # Examples
///
/// ```
/// use warden_review::checklist::RowSequence;
///
/// let mut ids = RowSequence::new();
/// assert_eq!(ids.next_id(), 0);
/// assert_eq!(ids.next_id(), 1);
/// assert_eq!(ids.issued(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RowSequence {
    next: usize,
}

impl RowSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids taken so far.
    pub fn issued(&self) -> usize {
        self.next
    }
}

/// One rendered checklist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistRow {
    pub id: usize,
    /// Index of the template item this row came from.
    pub item: usize,
    pub category: String,
    pub claim: String,
    pub explain: String,
    pub status: ReviewStatus,
}

impl ChecklistRow {
    /// Pipe-delimited table row, newline terminated.
    pub fn render(&self, config: &ReviewConfig) -> String {
        format!(
            "|{}|{}|{}|{}|{}|\n",
            self.id,
            self.category,
            self.claim,
            self.explain,
            config.status_token(self.status)
        )
    }
}

/// A row that was dropped because it could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderWarning {
    pub item: usize,
    pub message: String,
}

/// Rows of one run, plus the rows that were dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Checklist {
    pub rows: Vec<ChecklistRow>,
    pub warnings: Vec<RenderWarning>,
}

impl Checklist {
    /// All rows, rendered.
    pub fn render_rows(&self, config: &ReviewConfig) -> String {
        self.rows.iter().map(|row| row.render(config)).collect()
    }
}

/// What the diff says about the pull request.
#[derive(Debug, Clone, Default)]
pub struct DiffEvidence {
    pub changes: Vec<ChangeEntry>,
    /// `(language, checker)` pairs in first-seen order.
    pub languages: Vec<(String, String)>,
    /// `None` when a `.spec` diff could not be read.
    pub license_changed: Option<bool>,
    pub version_changed: Option<bool>,
}

/// The pull request a checklist is built for.
#[derive(Debug, Clone, Default)]
pub struct ChecklistContext {
    pub owner: String,
    pub repo: String,
    pub target_branch: String,
    /// `None` when the changed-file listing was unavailable.
    pub evidence: Option<DiffEvidence>,
}

/// Turns a template and facts into checklist rows.
///
/// Groups are walked `basic`, then the group named after the repository
/// owner, then `customization.<repo>`. An item yields zero, one, or several
/// rows depending on its condition.
#[derive(Debug, Clone)]
pub struct ChecklistBuilder {
    default_branch: String,
}

impl ChecklistBuilder {
    /// Builder for a repository whose integration branch is `default_branch`.
    pub fn new(default_branch: impl Into<String>) -> Self {
        Self {
            default_branch: default_branch.into(),
        }
    }

    /// Build the rows. `facts` is `None` when the rules could not run.
    pub fn build(
        &self,
        template: &ChecklistTemplate,
        facts: Option<&FactSet>,
        context: &ChecklistContext,
    ) -> Checklist {
        let mut ids = RowSequence::new();
        let mut checklist = Checklist::default();
        let groups = [
            Group::Basic,
            Group::Organization(context.owner.clone()),
            Group::Customization(context.repo.clone()),
        ];

        for group in &groups {
            for (index, item) in template.items().iter().enumerate() {
                if &item.group != group || self.excluded_on_branch(item, context) {
                    continue;
                }
                for vars in instances(item, facts, context) {
                    match render(item, &vars) {
                        Ok((claim, explain)) => checklist.rows.push(ChecklistRow {
                            id: ids.next_id(),
                            item: index,
                            category: item.category.clone(),
                            claim,
                            explain,
                            status: ReviewStatus::default(),
                        }),
                        Err(e) => {
                            warn!(item = index, condition = %item.condition, "dropping checklist row: {e}");
                            checklist.warnings.push(RenderWarning {
                                item: index,
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        debug!(rows = ids.issued(), dropped = checklist.warnings.len(), "checklist built");
        checklist
    }

    fn excluded_on_branch(&self, item: &ChecklistItemSpec, context: &ChecklistContext) -> bool {
        matches!(item.group, Group::Organization(_))
            && item.name.as_deref() == Some(LATEST_VERSION)
            && context.target_branch == self.default_branch
    }
}

/// Parameterless rows keep their text verbatim, braces included.
fn render(item: &ChecklistItemSpec, vars: &Vars<'_>) -> warden_core::Result<(String, String)> {
    if vars.is_empty() {
        return Ok((item.claim.clone(), item.explain.clone()));
    }
    Ok((fill(&item.claim, vars)?, fill(&item.explain, vars)?))
}

/// `@a, @b`
pub fn mentions(identities: &[String]) -> String {
    identities
        .iter()
        .map(|id| format!("@{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Placeholder sets for the rows `item` produces; empty when excluded.
fn instances(
    item: &ChecklistItemSpec,
    facts: Option<&FactSet>,
    context: &ChecklistContext,
) -> Vec<Vars<'static>> {
    let evidence = context.evidence.as_ref();
    let once = |included: bool| if included { vec![Vars::new()] } else { Vec::new() };

    match item.condition {
        Condition::CodeModified if item.name.as_deref() == Some(STATIC_CHECK) => {
            let Some(languages) = evidence.map(|e| &e.languages).filter(|l| !l.is_empty()) else {
                return Vec::new();
            };
            let (names, checkers): (Vec<&str>, Vec<&str>) = languages
                .iter()
                .map(|(lang, checker)| (lang.as_str(), checker.as_str()))
                .unzip();
            vec![Vars::from([
                ("lang", names.join("/")),
                ("checker", checkers.join("/")),
            ])]
        }
        Condition::CodeModified => once(true),
        Condition::NewFileAdd => once(evidence.is_some_and(|e| {
            e.changes.iter().any(|c| c.status == ChangeStatus::Added)
        })),
        Condition::LicenseChange => once(evidence.and_then(|e| e.license_changed) == Some(true)),
        Condition::VersionChange => once(evidence.and_then(|e| e.version_changed) == Some(true)),
        Condition::MaintainerChange => {
            let Some(facts) = facts else {
                return Vec::new();
            };
            if item.name.as_deref() == Some(MAINTAINER_NOTICE) {
                return once(facts.has_maintainer_change());
            }
            facts
                .maintainer_changes
                .iter()
                .map(|(sig, change)| {
                    Vars::from([("sig", sig.clone()), ("owners", mentions(&change.current_owners))])
                })
                .collect()
        }
        Condition::SigUpdate => facts
            .map(|f| {
                f.pending_sig_updates()
                    .map(|(sig, owners)| {
                        Vars::from([("sig", sig.to_string()), ("owners", mentions(owners))])
                    })
                    .collect()
            })
            .unwrap_or_default(),
        Condition::RepoIntroduce => once(facts.is_some_and(|f| f.repository_introduced)),
        Condition::RepoBlacklistChange => once(facts.is_some_and(|f| f.repository_recycled)),
        Condition::CommitterChange => facts
            .map(|f| {
                f.committer_changes
                    .iter()
                    .map(|id| Vars::from([("committer", id.clone())]))
                    .collect()
            })
            .unwrap_or_default(),
        Condition::SanityCheck
        | Condition::RepoOwnershipChange
        | Condition::NewBranchAdd
        | Condition::NewMembersAdd
        | Condition::SigInfoChange => {
            debug!(condition = %item.condition, "no detector for condition, including item");
            once(true)
        }
        Condition::Unconditional => once(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_governance::MaintainerChange;

    const TEMPLATE: &str = "\
basic:
  code:
    - condition: code-modified
      name: static-check
      claim: '{lang} code passes {checker}'
      explain: ''
    - condition: new-file-add
      claim: New files have license headers
      explain: ''
    - condition: version-change
      claim: Version bump is explained
      explain: ''
src-openeuler:
  package:
    - name: PR-latest-version
      claim: Upstream latest version
      explain: ''
customization:
  community:
    - condition: maintainer-change
      name: maintainer-add-explain
      claim: Explain the maintainer change
      explain: ''
    - condition: maintainer-change
      name: maintainer-change-lgtm
      claim: '{sig} maintainers {owners} approve'
      explain: ''
    - condition: sig-update
      claim: '{sig} owners {owners} review'
      explain: ''
    - condition: committer-change
      claim: '@{committer} acknowledges'
      explain: ''
    - condition: repo-introduce
      claim: New repository is justified
      explain: ''
    - condition: repo-blacklist-change
      claim: Recycling is approved by all members
      explain: ''
    - condition: sig-update
      claim: 'broken {committer}'
      explain: ''
";

    fn template() -> ChecklistTemplate {
        ChecklistTemplate::from_yaml(TEMPLATE).unwrap()
    }

    fn context(owner: &str, repo: &str, target: &str, evidence: Option<DiffEvidence>) -> ChecklistContext {
        ChecklistContext {
            owner: owner.into(),
            repo: repo.into(),
            target_branch: target.into(),
            evidence,
        }
    }

    fn claims(checklist: &Checklist) -> Vec<&str> {
        checklist.rows.iter().map(|r| r.claim.as_str()).collect()
    }

    #[test]
    fn static_check_names_languages() {
        let evidence = DiffEvidence {
            languages: vec![
                ("Python".into(), "pylint-3".into()),
                ("GO".into(), "golint".into()),
            ],
            ..Default::default()
        };
        let checklist = ChecklistBuilder::new("master").build(
            &template(),
            None,
            &context("openeuler", "kernel", "master", Some(evidence)),
        );
        assert_eq!(claims(&checklist), vec!["Python/GO code passes pylint-3/golint"]);
    }

    #[test]
    fn unavailable_diff_asserts_nothing() {
        let checklist = ChecklistBuilder::new("master").build(
            &template(),
            None,
            &context("openeuler", "kernel", "master", None),
        );
        assert!(checklist.rows.is_empty());
    }

    #[test]
    fn latest_version_only_off_default_branch() {
        let builder = ChecklistBuilder::new("master");
        let on_master = builder.build(&template(), None, &context("src-openeuler", "pkg", "master", None));
        assert!(on_master.rows.is_empty());

        let on_lts = builder.build(
            &template(),
            None,
            &context("src-openeuler", "pkg", "openEuler-24.03-LTS", None),
        );
        assert_eq!(claims(&on_lts), vec!["Upstream latest version"]);
        assert_eq!(on_lts.rows[0].item, 3);
    }

    #[test]
    fn community_rows_follow_template_order() {
        let mut facts = FactSet {
            repository_introduced: true,
            ..Default::default()
        };
        facts.maintainer_changes.insert(
            "sig-storage".into(),
            MaintainerChange {
                removed: vec!["bob".into()],
                current_owners: vec!["alice".into(), "bob".into()],
                ..Default::default()
            },
        );
        facts.touched_sigs.insert("sig-storage".into(), vec!["alice".into(), "bob".into()]);
        facts.touched_sigs.insert("sig-net".into(), vec!["erin".into()]);
        facts.committer_changes.insert("dave".into());

        let checklist = ChecklistBuilder::new("master").build(
            &template(),
            Some(&facts),
            &context("openeuler", "community", "master", Some(DiffEvidence::default())),
        );

        assert_eq!(
            claims(&checklist),
            vec![
                "Explain the maintainer change",
                "sig-storage maintainers @alice, @bob approve",
                "sig-net owners @erin review",
                "@dave acknowledges",
                "New repository is justified",
            ]
        );
        let ids: Vec<usize> = checklist.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        // The broken sig-update row is dropped for sig-net only; ids stay contiguous.
        assert_eq!(checklist.warnings.len(), 1);
        assert_eq!(checklist.warnings[0].item, 10);
    }

    #[test]
    fn version_change_needs_positive_evidence() {
        let builder = ChecklistBuilder::new("master");
        let undetermined = DiffEvidence {
            version_changed: None,
            ..Default::default()
        };
        let checklist = builder.build(&template(), None, &context("x", "y", "master", Some(undetermined)));
        assert!(checklist.rows.is_empty());

        let changed = DiffEvidence {
            version_changed: Some(true),
            ..Default::default()
        };
        let checklist = builder.build(&template(), None, &context("x", "y", "master", Some(changed)));
        assert_eq!(claims(&checklist), vec!["Version bump is explained"]);
    }

    #[test]
    fn rows_render_with_status_tokens() {
        let mut config = ReviewConfig::default();
        config.status.ongoing = Some(":hourglass:".into());
        let row = ChecklistRow {
            id: 3,
            item: 0,
            category: "Code".into(),
            claim: "claim".into(),
            explain: "why".into(),
            status: ReviewStatus::Ongoing,
        };
        assert_eq!(row.render(&config), "|3|Code|claim|why|:hourglass:|\n");
    }

    #[test]
    fn plain_rows_keep_literal_braces() {
        let template = ChecklistTemplate::from_yaml(
            "basic:\n  package:\n    - claim: 'Changelog entry uses %{version}-%{release}'\n      explain: 'Matches {{Version}}'\n    - claim: Commit message is clear\n      explain: ''\n",
        )
        .unwrap();
        let checklist = ChecklistBuilder::new("master").build(
            &template,
            None,
            &context("src-openeuler", "kernel", "master", None),
        );

        assert!(checklist.warnings.is_empty());
        assert_eq!(
            claims(&checklist),
            vec!["Changelog entry uses %{version}-%{release}", "Commit message is clear"]
        );
        assert_eq!(checklist.rows[0].explain, "Matches {{Version}}");
    }

    #[test]
    fn mentions_join_with_at_signs() {
        assert_eq!(mentions(&["a".into(), "b".into()]), "@a, @b");
        assert_eq!(mentions(&[]), "");
    }
}
