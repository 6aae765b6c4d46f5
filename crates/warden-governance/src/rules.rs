//! Governance rules: from changed files and record snapshots to facts.
//!
//! Five derivations, each independent of the others:
//!
//! - maintainer changes per SIG (`sig/<name>/sig-info.yaml`, modified)
//! - touched SIG records (added or modified `sig-info.yaml`)
//! - repository introduction (new ownership file under a known organization)
//! - repository recycling (moved into, added to, or deleted toward the recycle bin)
//! - committer assignment changes per identity
//!
//! Baseline owners are notified, so maintainers removed by the change still
//! hear about it. The pull request author is never in a notify set.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};
use warden_core::{ChangeEntry, ChangeStatus, WardenError};

use crate::facts::{FactSet, MaintainerChange};
use crate::store::{GovernanceStore, Revision};

/// SIG whose record is a template, never a real group.
pub const TEMPLATE_SIG: &str = "sig-template";

/// SIG directory that holds decommissioned repositories.
pub const RECYCLE_SIG: &str = "sig-recycle";

/// Organizations whose repositories have ownership files.
pub const ORGANIZATIONS: [&str; 2] = ["openeuler", "src-openeuler"];

const RECYCLED_ORG: &str = "src-openeuler";

/// SIG name of a `sig/<name>/sig-info.yaml` path.
///
/// # Examples
///
/// ```
/// use warden_governance::rules::sig_of_record;
///
/// assert_eq!(sig_of_record("sig/sig-storage/sig-info.yaml"), Some("sig-storage"));
/// assert_eq!(sig_of_record("sig/sigs.yaml"), None);
/// assert_eq!(sig_of_record("sig/a/openeuler/sig-info.yaml"), None);
/// ```
pub fn sig_of_record(path: &str) -> Option<&str> {
    match path.split('/').collect::<Vec<_>>().as_slice() {
        ["sig", name, "sig-info.yaml"] if !name.is_empty() => Some(*name),
        _ => None,
    }
}

/// Evaluates the governance rules for one pull request.
pub struct RuleEngine<S: GovernanceStore> {
    store: S,
    author: String,
}

impl<S: GovernanceStore> RuleEngine<S> {
    /// Engine reading records from `store`, on behalf of a change by `author`.
    pub fn new(store: S, author: impl Into<String>) -> Self {
        Self {
            store,
            author: author.into(),
        }
    }

    /// Pull request author.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Run all derivations.
    ///
    /// # Errors
    ///
    /// Propagates store errors; a [`WardenError::RestoreFailure`] means the
    /// working copy is in an unknown state and the run must stop.
    pub fn evaluate(&self, changes: &[ChangeEntry]) -> Result<FactSet, WardenError> {
        let facts = FactSet {
            maintainer_changes: self.maintainer_changes(changes)?,
            touched_sigs: self.touched_sigs(changes)?,
            repository_introduced: Self::repository_introduced(changes),
            repository_recycled: Self::repository_recycled(changes),
            committer_changes: self.committer_changes(changes)?,
        };
        info!(
            files = changes.len(),
            maintainer_changes = facts.maintainer_changes.len(),
            touched_sigs = facts.touched_sigs.len(),
            committer_changes = facts.committer_changes.len(),
            introduced = facts.repository_introduced,
            recycled = facts.repository_recycled,
            "governance rules evaluated"
        );
        Ok(facts)
    }

    /// SIGs whose maintainer set differs from the baseline.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn maintainer_changes(
        &self,
        changes: &[ChangeEntry],
    ) -> Result<BTreeMap<String, MaintainerChange>, WardenError> {
        let mut out = BTreeMap::new();
        for entry in changes.iter().filter(|e| e.status == ChangeStatus::Modified) {
            let Some(sig) = sig_of_record(&entry.path) else {
                continue;
            };
            let proposed = self.store.record_at(Revision::WorkingCopy, &entry.path)?;
            let baseline = self.store.record_at(Revision::TargetBranch, &entry.path)?;

            let proposed_set = proposed.maintainer_set();
            let baseline_set = baseline.maintainer_set();
            if proposed_set == baseline_set {
                continue;
            }

            let change = MaintainerChange {
                added: proposed
                    .maintainers
                    .iter()
                    .filter(|m| !baseline_set.contains(m.as_str()))
                    .cloned()
                    .collect(),
                removed: baseline
                    .maintainers
                    .iter()
                    .filter(|m| !proposed_set.contains(m.as_str()))
                    .cloned()
                    .collect(),
                current_owners: self.without_author(&baseline.maintainers),
            };
            debug!(sig, added = ?change.added, removed = ?change.removed, "maintainers changed");
            out.insert(sig.to_string(), change);
        }
        Ok(out)
    }

    /// Added or modified SIG records, with their baseline owners.
    ///
    /// A new SIG has no baseline, so its owner list is empty.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn touched_sigs(
        &self,
        changes: &[ChangeEntry],
    ) -> Result<BTreeMap<String, Vec<String>>, WardenError> {
        let mut out = BTreeMap::new();
        for entry in changes {
            if !matches!(entry.status, ChangeStatus::Added | ChangeStatus::Modified) {
                continue;
            }
            let Some(sig) = sig_of_record(&entry.path) else {
                continue;
            };
            if sig == TEMPLATE_SIG || out.contains_key(sig) {
                continue;
            }
            let baseline = self.store.record_at(Revision::TargetBranch, &entry.path)?;
            out.insert(sig.to_string(), self.without_author(&baseline.maintainers));
        }
        Ok(out)
    }

    /// Whether a repository ownership file was added.
    ///
    /// Matches `sig/<sig>/<org>/<name>.yaml` and `sig/<sig>/<org>/<shard>/<name>.yaml`
    /// for a known organization.
    pub fn repository_introduced(changes: &[ChangeEntry]) -> bool {
        changes
            .iter()
            .filter(|e| e.status == ChangeStatus::Added && e.path.ends_with(".yaml"))
            .any(|e| {
                let segments = e.segments();
                (segments.len() == 4 || segments.len() == 5)
                    && segments[0] == "sig"
                    && ORGANIZATIONS.contains(&segments[2])
            })
    }

    /// Whether a `src-openeuler` repository left its SIG for good.
    ///
    /// True when a file is renamed into the recycle bin, added to the recycle
    /// bin, or deleted without a same-named file added under another SIG.
    pub fn repository_recycled(changes: &[ChangeEntry]) -> bool {
        let mut deleted: BTreeSet<&str> = BTreeSet::new();
        let mut rehomed: BTreeSet<&str> = BTreeSet::new();

        for entry in changes {
            let segments = entry.segments();
            let recycled_org = segments.len() > 2 && segments[2] == RECYCLED_ORG;
            let in_recycle_bin = recycled_org && segments[0] == "sig" && segments[1] == RECYCLE_SIG;

            if entry.status == ChangeStatus::Renamed {
                if in_recycle_bin {
                    debug!(path = %entry.path, "repository renamed into recycle bin");
                    return true;
                }
                continue;
            }
            if !entry.path.starts_with("sig/") || !entry.path.ends_with(".yaml") || !recycled_org {
                continue;
            }
            match entry.status {
                ChangeStatus::Deleted => {
                    deleted.insert(entry.file_name());
                }
                ChangeStatus::Added if in_recycle_bin => {
                    debug!(path = %entry.path, "repository added to recycle bin");
                    return true;
                }
                ChangeStatus::Added => {
                    rehomed.insert(entry.file_name());
                }
                _ => {}
            }
        }

        deleted.difference(&rehomed).next().is_some()
    }

    /// Committers whose repository assignments changed, author excluded.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn committer_changes(
        &self,
        changes: &[ChangeEntry],
    ) -> Result<BTreeSet<String>, WardenError> {
        let mut out = BTreeSet::new();
        for entry in changes.iter().filter(|e| e.status == ChangeStatus::Modified) {
            if sig_of_record(&entry.path).is_none() {
                continue;
            }
            let proposed = self.store.record_at(Revision::WorkingCopy, &entry.path)?;
            let baseline = self.store.record_at(Revision::TargetBranch, &entry.path)?;
            let proposed_map = proposed.committer_map();
            let baseline_map = baseline.committer_map();

            let identities: BTreeSet<&str> =
                proposed_map.keys().chain(baseline_map.keys()).copied().collect();
            for identity in identities {
                if proposed_map.get(identity) != baseline_map.get(identity) {
                    out.insert(identity.to_string());
                }
            }
        }
        if out.remove(&self.author) {
            debug!(author = %self.author, "author dropped from committer changes");
        }
        Ok(out)
    }

    fn without_author(&self, identities: &[String]) -> Vec<String> {
        identities
            .iter()
            .filter(|id| **id != self.author)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const STORAGE: &str = "sig/sig-storage/sig-info.yaml";

    fn entry(status: ChangeStatus, path: &str) -> ChangeEntry {
        ChangeEntry::new(status, path)
    }

    fn maintainers(ids: &[&str]) -> String {
        let mut yaml = String::from("maintainers:\n");
        for id in ids {
            yaml.push_str(&format!("  - gitee_id: {id}\n"));
        }
        yaml
    }

    fn store(baseline: &str, proposed: &str) -> MemoryStore {
        MemoryStore::new()
            .with_yaml(Revision::TargetBranch, STORAGE, baseline)
            .unwrap()
            .with_yaml(Revision::WorkingCopy, STORAGE, proposed)
            .unwrap()
    }

    #[test]
    fn reordered_maintainers_are_not_a_change() {
        let engine = RuleEngine::new(
            store(&maintainers(&["alice", "bob"]), &maintainers(&["bob", "alice"])),
            "zed",
        );
        let changes = [entry(ChangeStatus::Modified, STORAGE)];
        assert!(engine.maintainer_changes(&changes).unwrap().is_empty());
    }

    #[test]
    fn added_maintainer_notifies_baseline_owners() {
        let engine = RuleEngine::new(
            store(&maintainers(&["alice"]), &maintainers(&["alice", "erin"])),
            "erin",
        );
        let changes = [entry(ChangeStatus::Modified, STORAGE)];
        let found = engine.maintainer_changes(&changes).unwrap();
        let change = &found["sig-storage"];
        assert_eq!(change.added, vec!["erin"]);
        assert!(change.removed.is_empty());
        assert_eq!(change.current_owners, vec!["alice"]);
    }

    #[test]
    fn author_is_dropped_from_current_owners() {
        let engine = RuleEngine::new(
            store(&maintainers(&["alice", "bob"]), &maintainers(&["alice"])),
            "alice",
        );
        let found = engine
            .maintainer_changes(&[entry(ChangeStatus::Modified, STORAGE)])
            .unwrap();
        assert_eq!(found["sig-storage"].current_owners, vec!["bob"]);
    }

    #[test]
    fn added_records_are_not_maintainer_changes() {
        let engine = RuleEngine::new(store("", &maintainers(&["alice"])), "zed");
        let changes = [entry(ChangeStatus::Added, STORAGE)];
        assert!(engine.maintainer_changes(&changes).unwrap().is_empty());
        assert_eq!(engine.touched_sigs(&changes).unwrap()["sig-storage"], Vec::<String>::new());
    }

    #[test]
    fn touched_sigs_skip_template_and_aggregate() {
        let engine = RuleEngine::new(MemoryStore::new(), "zed");
        let changes = [
            entry(ChangeStatus::Modified, "sig/sigs.yaml"),
            entry(ChangeStatus::Modified, "sig/sig-template/sig-info.yaml"),
            entry(ChangeStatus::Deleted, "sig/sig-old/sig-info.yaml"),
            entry(ChangeStatus::Modified, "sig/sig-net/sig-info.yaml"),
        ];
        let touched = engine.touched_sigs(&changes).unwrap();
        assert_eq!(touched.keys().collect::<Vec<_>>(), vec!["sig-net"]);
    }

    #[test]
    fn repository_introduced_shapes() {
        let yes = |p: &str| RuleEngine::<MemoryStore>::repository_introduced(&[entry(ChangeStatus::Added, p)]);
        assert!(yes("sig/new-sig/openeuler/foo.yaml"));
        assert!(yes("sig/sig-storage/src-openeuler/l/lvm2.yaml"));
        assert!(!yes("sig/sig-storage/other-org/l/lvm2.yaml"));
        assert!(!yes("sig/sig-storage/sig-info.yaml"));
        assert!(!yes("sig/sig-storage/src-openeuler/l/lvm2.md"));
        assert!(!RuleEngine::<MemoryStore>::repository_introduced(&[entry(
            ChangeStatus::Modified,
            "sig/new-sig/openeuler/foo.yaml"
        )]));
    }

    #[test]
    fn recycle_by_rename() {
        let changes = [ChangeEntry::renamed(
            "sig/sig-a/src-openeuler/p/pkg.yaml",
            "sig/sig-recycle/src-openeuler/p/pkg.yaml",
        )];
        assert!(RuleEngine::<MemoryStore>::repository_recycled(&changes));
    }

    #[test]
    fn rename_between_sigs_is_not_recycling() {
        let changes = [ChangeEntry::renamed(
            "sig/sig-a/src-openeuler/p/pkg.yaml",
            "sig/sig-b/src-openeuler/p/pkg.yaml",
        )];
        assert!(!RuleEngine::<MemoryStore>::repository_recycled(&changes));
    }

    #[test]
    fn recycle_by_add_to_bin() {
        let changes = [entry(ChangeStatus::Added, "sig/sig-recycle/src-openeuler/p/pkg.yaml")];
        assert!(RuleEngine::<MemoryStore>::repository_recycled(&changes));
    }

    #[test]
    fn delete_matched_by_add_into_bin_still_recycles() {
        let changes = [
            entry(ChangeStatus::Deleted, "sig/sig-a/src-openeuler/p/pkg.yaml"),
            entry(ChangeStatus::Added, "sig/sig-recycle/src-openeuler/p/pkg.yaml"),
        ];
        assert!(RuleEngine::<MemoryStore>::repository_recycled(&changes));
    }

    #[test]
    fn deletes_outside_src_openeuler_are_ignored() {
        let changes = [entry(ChangeStatus::Deleted, "sig/sig-a/openeuler/p/pkg.yaml")];
        assert!(!RuleEngine::<MemoryStore>::repository_recycled(&changes));
    }

    #[test]
    fn committer_moves_are_flagged_both_ways() {
        let baseline = "\
repositories:
  - repo: [src-openeuler/a]
    committers: [{gitee_id: carol}, {gitee_id: dave}]
";
        let proposed = "\
repositories:
  - repo: [src-openeuler/a, src-openeuler/b]
    committers: [{gitee_id: carol}]
  - repo: src-openeuler/c
    committers: [{gitee_id: erin}]
";
        let engine = RuleEngine::new(store(baseline, proposed), "zed");
        let changed = engine
            .committer_changes(&[entry(ChangeStatus::Modified, STORAGE)])
            .unwrap();
        assert_eq!(
            changed.into_iter().collect::<Vec<_>>(),
            vec!["carol", "dave", "erin"]
        );
    }

    #[test]
    fn store_errors_propagate() {
        struct Broken;
        impl GovernanceStore for Broken {
            fn record_at(
                &self,
                _: Revision,
                _: &str,
            ) -> Result<crate::record::GovernanceRecord, WardenError> {
                Err(WardenError::RestoreFailure {
                    rev: "tmp_pr".into(),
                    reason: "locked".into(),
                })
            }
        }
        let engine = RuleEngine::new(Broken, "zed");
        let err = engine
            .evaluate(&[entry(ChangeStatus::Modified, STORAGE)])
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
