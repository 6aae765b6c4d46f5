//! Governance records and the rules evaluated over them.
//!
//! Reads `sig-info.yaml` records from the proposed working copy and from the
//! target branch, then derives the facts that decide which checklist items a
//! pull request gets: maintainer changes, touched SIGs, introduced or
//! recycled repositories, and committer reassignments.

pub mod checkout;
pub mod facts;
pub mod record;
pub mod rules;
pub mod store;

pub use checkout::{with_checkout, Checkout, GitCheckout, ScopedCheckout};
pub use facts::{Fact, FactSet, MaintainerChange};
pub use record::{GovernanceRecord, RepositoryAssignment};
pub use rules::RuleEngine;
pub use store::{GovernanceStore, MemoryStore, Revision, WorkingCopyStore};
