//! Scoped switching of a working copy to another revision.
//!
//! A baseline read checks out the target branch, reads, and switches back.
//! [`with_checkout`] restores the original revision on every exit path: a
//! failing read, an early return, or a panic unwinding through the guard.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use tracing::{debug, error};
use warden_core::WardenError;

/// Moves a working copy between revisions.
pub trait Checkout {
    /// The revision to come back to: a branch name, or a commit id when HEAD
    /// is detached.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Git`] if HEAD cannot be resolved.
    fn current(&self) -> Result<String, WardenError>;

    /// Switch the working copy to `rev`.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Git`] if the switch fails.
    fn switch(&self, rev: &str) -> Result<(), WardenError>;
}

impl<C: Checkout + ?Sized> Checkout for &C {
    fn current(&self) -> Result<String, WardenError> {
        (**self).current()
    }

    fn switch(&self, rev: &str) -> Result<(), WardenError> {
        (**self).switch(rev)
    }
}

/// [`Checkout`] for a git working copy.
///
/// HEAD is resolved with `git2`; switching runs `git checkout`, which keeps
/// the index and working tree in step the same way an operator would.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    root: PathBuf,
}

impl GitCheckout {
    /// Checkout helper for the working copy at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Working copy root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Checkout for GitCheckout {
    fn current(&self) -> Result<String, WardenError> {
        let repo = Repository::open(&self.root)
            .map_err(|e| WardenError::Git(format!("failed to open repository: {e}")))?;
        let head = repo
            .head()
            .map_err(|e| WardenError::Git(format!("failed to resolve HEAD: {e}")))?;

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(name.to_string());
            }
        }
        head.target()
            .map(|oid| oid.to_string())
            .ok_or_else(|| WardenError::Git("HEAD has no target".into()))
    }

    fn switch(&self, rev: &str) -> Result<(), WardenError> {
        debug!(root = %self.root.display(), rev, "git checkout");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(["checkout", "--quiet", rev])
            .output()
            .map_err(|e| WardenError::Git(format!("failed to run git checkout: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WardenError::Git(format!(
                "git checkout {rev} failed: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Holds a working copy on a foreign revision until restored.
///
/// Dropping an unrestored guard switches back on a best-effort basis; call
/// [`ScopedCheckout::restore`] to observe failures.
pub struct ScopedCheckout<C: Checkout> {
    checkout: C,
    original: String,
    restored: bool,
}

impl<C: Checkout> ScopedCheckout<C> {
    /// Record the current revision and switch to `rev`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if HEAD cannot be resolved. If the switch
    /// itself fails, a restore is attempted before the error is returned.
    pub fn enter(checkout: C, rev: &str) -> Result<Self, WardenError> {
        let original = checkout.current()?;
        let guard = Self {
            checkout,
            original,
            restored: false,
        };
        guard.checkout.switch(rev)?;
        Ok(guard)
    }

    /// Revision the working copy returns to.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Switch back to the original revision.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::RestoreFailure`] if the switch fails.
    pub fn restore(mut self) -> Result<(), WardenError> {
        self.restored = true;
        self.checkout
            .switch(&self.original)
            .map_err(|e| WardenError::RestoreFailure {
                rev: self.original.clone(),
                reason: e.to_string(),
            })
    }
}

impl<C: Checkout> Drop for ScopedCheckout<C> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.checkout.switch(&self.original) {
            error!(rev = %self.original, "failed to restore working copy: {e}");
        }
    }
}

/// Run `read` with the working copy switched to `rev`, then switch back.
///
/// A restore failure takes precedence over the read's own result, since any
/// later read would see the wrong revision.
///
/// # Errors
///
/// Returns [`WardenError::RestoreFailure`] if switching back fails, otherwise
/// whatever entering the checkout or `read` returned.
pub fn with_checkout<C, T, F>(checkout: C, rev: &str, read: F) -> Result<T, WardenError>
where
    C: Checkout,
    F: FnOnce() -> Result<T, WardenError>,
{
    let guard = ScopedCheckout::enter(checkout, rev)?;
    let result = read();
    guard.restore()?;
    result
}
