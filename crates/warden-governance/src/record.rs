//! Parsed `sig-info.yaml` governance records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use warden_core::WardenError;

/// One repository and the committers assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryAssignment {
    /// Repository name, e.g. `src-openeuler/kernel`.
    pub repository_name: String,
    /// Identities with write access.
    pub committers: BTreeSet<String>,
}

/// A SIG's governance record.
///
/// # Examples
///
/// ```
/// use warden_governance::record::GovernanceRecord;
///
/// let record = GovernanceRecord::from_yaml("
/// name: sig-storage
/// maintainers:
///   - gitee_id: alice
///   - gitee_id: bob
/// repositories:
///   - repo: [src-openeuler/lvm2, src-openeuler/multipath-tools]
///     committers:
///       - gitee_id: carol
/// ").unwrap();
/// assert_eq!(record.maintainers, vec!["alice", "bob"]);
/// assert_eq!(record.repositories.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GovernanceRecord {
    /// Maintainer identities in declaration order, without repeats.
    pub maintainers: Vec<String>,
    /// One entry per repository name.
    pub repositories: Vec<RepositoryAssignment>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(default)]
    maintainers: Option<Vec<RawPerson>>,
    #[serde(default)]
    repositories: Option<Vec<RawRepositories>>,
}

#[derive(Debug, Deserialize)]
struct RawPerson {
    #[serde(default, alias = "gitcode_id")]
    gitee_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRepositories {
    #[serde(default)]
    repo: Option<OneOrMany>,
    #[serde(default)]
    committers: Option<Vec<RawPerson>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

impl GovernanceRecord {
    /// Parse a record from YAML. An empty document is an empty record.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Yaml`] if the document is malformed.
    pub fn from_yaml(content: &str) -> Result<Self, WardenError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<RawRecord> = serde_yaml::from_str(content)?;
        Ok(raw.map(Self::from_raw).unwrap_or_default())
    }

    fn from_raw(raw: RawRecord) -> Self {
        let mut maintainers: Vec<String> = Vec::new();
        for id in raw.maintainers.unwrap_or_default().into_iter().filter_map(|p| p.gitee_id) {
            if !maintainers.contains(&id) {
                maintainers.push(id);
            }
        }

        let mut repositories = Vec::new();
        for entry in raw.repositories.unwrap_or_default() {
            let committers: BTreeSet<String> = entry
                .committers
                .unwrap_or_default()
                .into_iter()
                .filter_map(|p| p.gitee_id)
                .collect();
            for name in entry.repo.map(OneOrMany::into_vec).unwrap_or_default() {
                repositories.push(RepositoryAssignment {
                    repository_name: name,
                    committers: committers.clone(),
                });
            }
        }

        Self {
            maintainers,
            repositories,
        }
    }

    /// Whether the record has no content (missing file or new SIG).
    pub fn is_empty(&self) -> bool {
        self.maintainers.is_empty() && self.repositories.is_empty()
    }

    /// Maintainers as a set, for order-independent comparison.
    pub fn maintainer_set(&self) -> BTreeSet<&str> {
        self.maintainers.iter().map(String::as_str).collect()
    }

    /// Committer identity → every repository it is assigned to.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_governance::record::GovernanceRecord;
    ///
    /// let record = GovernanceRecord::from_yaml("
    /// repositories:
    ///   - repo: [a]
    ///     committers: [{gitee_id: carol}]
    ///   - repo: b
    ///     committers: [{gitee_id: carol}, {gitee_id: dave}]
    /// ").unwrap();
    /// let map = record.committer_map();
    /// assert_eq!(map["carol"].len(), 2);
    /// assert_eq!(map["dave"].len(), 1);
    /// ```
    pub fn committer_map(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut map: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for assignment in &self.repositories {
            for committer in &assignment.committers {
                map.entry(committer.as_str())
                    .or_default()
                    .insert(assignment.repository_name.as_str());
            }
        }
        map
    }
}
