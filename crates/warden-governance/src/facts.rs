//! Semantic facts derived from one evaluation run.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// One governance fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Fact {
    /// A SIG's maintainer set differs from the baseline.
    #[serde(rename_all = "camelCase")]
    MaintainerSetChanged {
        sig: String,
        added_or_removed: bool,
        current_owners: Vec<String>,
    },
    /// A SIG record was added or edited.
    SigRecordTouched { sig: String, owners: Vec<String> },
    /// A repository ownership file was added.
    RepositoryIntroduced,
    /// A repository was moved to, or deleted into, the recycle bin.
    RepositoryRecycled,
    /// A committer's repository assignments changed.
    CommitterAssignmentChanged { identity: String },
}

/// Maintainer delta for one SIG.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintainerChange {
    /// Maintainers present only in the working copy.
    pub added: Vec<String>,
    /// Maintainers present only on the target branch.
    pub removed: Vec<String>,
    /// Baseline maintainers to notify, in declaration order, author excluded.
    pub current_owners: Vec<String>,
}

impl MaintainerChange {
    /// Whether anyone joined or left.
    pub fn added_or_removed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// All facts of one run.
///
/// Keyed collections make equality independent of derivation order.
///
/// # Examples
///
/// ```
/// use warden_governance::facts::{FactSet, MaintainerChange};
///
/// let mut facts = FactSet::default();
/// facts.touched_sigs.insert("sig-a".into(), vec!["alice".into()]);
/// facts.touched_sigs.insert("sig-b".into(), vec![]);
/// facts.maintainer_changes.insert("sig-a".into(), MaintainerChange {
///     removed: vec!["bob".into()],
///     ..Default::default()
/// });
///
/// let pending: Vec<_> = facts.pending_sig_updates().map(|(sig, _)| sig).collect();
/// assert_eq!(pending, vec!["sig-b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactSet {
    /// SIG name → maintainer delta.
    pub maintainer_changes: BTreeMap<String, MaintainerChange>,
    /// SIG name → baseline owners, for every touched SIG record.
    pub touched_sigs: BTreeMap<String, Vec<String>>,
    pub repository_introduced: bool,
    pub repository_recycled: bool,
    /// Committers whose assignments changed, author excluded.
    pub committer_changes: BTreeSet<String>,
}

impl FactSet {
    /// Touched SIGs not already covered by a maintainer change.
    pub fn pending_sig_updates(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.touched_sigs
            .iter()
            .filter(|(sig, _)| !self.maintainer_changes.contains_key(sig.as_str()))
            .map(|(sig, owners)| (sig.as_str(), owners.as_slice()))
    }

    /// Whether any maintainer set changed.
    pub fn has_maintainer_change(&self) -> bool {
        !self.maintainer_changes.is_empty()
    }

    /// Flattened view, grouped by kind.
    pub fn facts(&self) -> Vec<Fact> {
        let mut out = Vec::new();
        for (sig, change) in &self.maintainer_changes {
            out.push(Fact::MaintainerSetChanged {
                sig: sig.clone(),
                added_or_removed: change.added_or_removed(),
                current_owners: change.current_owners.clone(),
            });
        }
        for (sig, owners) in &self.touched_sigs {
            out.push(Fact::SigRecordTouched {
                sig: sig.clone(),
                owners: owners.clone(),
            });
        }
        if self.repository_introduced {
            out.push(Fact::RepositoryIntroduced);
        }
        if self.repository_recycled {
            out.push(Fact::RepositoryRecycled);
        }
        for identity in &self.committer_changes {
            out.push(Fact::CommitterAssignmentChanged {
                identity: identity.clone(),
            });
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.facts().is_empty()
    }
}
