//! Reading governance records at the proposed or baseline revision.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use warden_core::WardenError;

use crate::checkout::{with_checkout, Checkout};
use crate::record::GovernanceRecord;

/// Which snapshot of the working copy to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Revision {
    /// The pull request's proposed state (HEAD).
    WorkingCopy,
    /// The pre-change baseline on the target branch.
    TargetBranch,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::WorkingCopy => write!(f, "working copy"),
            Revision::TargetBranch => write!(f, "target branch"),
        }
    }
}

/// Source of governance records.
pub trait GovernanceStore {
    /// The record stored at `path` (relative to the repository root) in `revision`.
    ///
    /// A path that does not exist in that revision yields an empty record.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Yaml`] for a malformed record,
    /// [`WardenError::RestoreFailure`] if a baseline read could not put the
    /// working copy back, or any I/O and git error met on the way.
    fn record_at(&self, revision: Revision, path: &str) -> Result<GovernanceRecord, WardenError>;
}

impl<S: GovernanceStore + ?Sized> GovernanceStore for &S {
    fn record_at(&self, revision: Revision, path: &str) -> Result<GovernanceRecord, WardenError> {
        (**self).record_at(revision, path)
    }
}

/// Store backed by a checked-out working copy.
///
/// Baseline reads switch the working copy to the target branch for the
/// duration of one read. Each baseline path is read at most once per store.
pub struct WorkingCopyStore<C: Checkout> {
    root: PathBuf,
    target: String,
    checkout: C,
    baseline: RefCell<BTreeMap<String, GovernanceRecord>>,
}

impl<C: Checkout> WorkingCopyStore<C> {
    /// Store over the working copy at `root`, with `target` as the baseline branch.
    pub fn new(root: impl Into<PathBuf>, target: impl Into<String>, checkout: C) -> Self {
        Self {
            root: root.into(),
            target: target.into(),
            checkout,
            baseline: RefCell::new(BTreeMap::new()),
        }
    }

    /// Baseline branch name.
    pub fn target(&self) -> &str {
        &self.target
    }

    fn read(&self, path: &str) -> Result<GovernanceRecord, WardenError> {
        read_record(&self.root.join(path))
    }
}

impl<C: Checkout> GovernanceStore for WorkingCopyStore<C> {
    fn record_at(&self, revision: Revision, path: &str) -> Result<GovernanceRecord, WardenError> {
        match revision {
            Revision::WorkingCopy => self.read(path),
            Revision::TargetBranch => {
                if let Some(record) = self.baseline.borrow().get(path) {
                    return Ok(record.clone());
                }
                debug!(path, target = %self.target, "reading baseline record");
                let record = with_checkout(&self.checkout, &self.target, || self.read(path))?;
                self.baseline
                    .borrow_mut()
                    .insert(path.to_string(), record.clone());
                Ok(record)
            }
        }
    }
}

fn read_record(file: &Path) -> Result<GovernanceRecord, WardenError> {
    match std::fs::read_to_string(file) {
        Ok(content) => GovernanceRecord::from_yaml(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %file.display(), "no governance record, treating as empty");
            Ok(GovernanceRecord::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// In-memory store for tests and dry runs.
///
/// # Examples
///
/// ```
/// use warden_governance::record::GovernanceRecord;
/// use warden_governance::store::{GovernanceStore, MemoryStore, Revision};
///
/// let store = MemoryStore::new().with_yaml(
///     Revision::TargetBranch,
///     "sig/sig-storage/sig-info.yaml",
///     "maintainers:\n  - gitee_id: alice\n",
/// ).unwrap();
/// let record = store.record_at(Revision::TargetBranch, "sig/sig-storage/sig-info.yaml").unwrap();
/// assert_eq!(record.maintainers, vec!["alice"]);
/// assert!(store.record_at(Revision::WorkingCopy, "sig/sig-storage/sig-info.yaml").unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<(Revision, String), GovernanceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parsed record.
    pub fn with_record(
        mut self,
        revision: Revision,
        path: impl Into<String>,
        record: GovernanceRecord,
    ) -> Self {
        self.records.insert((revision, path.into()), record);
        self
    }

    /// Add a record from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Yaml`] if `yaml` is malformed.
    pub fn with_yaml(
        self,
        revision: Revision,
        path: impl Into<String>,
        yaml: &str,
    ) -> Result<Self, WardenError> {
        let record = GovernanceRecord::from_yaml(yaml)?;
        Ok(self.with_record(revision, path, record))
    }
}

impl GovernanceStore for MemoryStore {
    fn record_at(&self, revision: Revision, path: &str) -> Result<GovernanceRecord, WardenError> {
        Ok(self
            .records
            .get(&(revision, path.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
