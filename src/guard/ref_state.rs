//! Capture and restore the working copy's position.
//!
//! A [`RefStateGuard`] is opened at the start of every version iteration. All
//! revision checkouts go through it; once one has happened the guard is armed
//! and must be released, which puts the working copy back where it was.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::{DocsError, Result};
use crate::vcs::{is_benign_submodule_failure, Vcs};

/// Where the working copy pointed when an iteration started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefState {
    /// On a named branch.
    Branch(String),
    /// Detached at a commit.
    Detached(String),
}

impl RefState {
    /// Record the current branch, or the commit id if HEAD is detached.
    pub fn capture<V: Vcs + ?Sized>(vcs: &V) -> Result<Self> {
        match vcs.current_branch()? {
            Some(branch) => Ok(RefState::Branch(branch)),
            None => Ok(RefState::Detached(vcs.head_commit()?)),
        }
    }

    /// Reference to check out to return to this state.
    pub fn reference(&self) -> &str {
        match self {
            RefState::Branch(name) | RefState::Detached(name) => name,
        }
    }
}

impl fmt::Display for RefState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefState::Branch(name) => write!(f, "branch '{name}'"),
            RefState::Detached(commit) => write!(f, "detached commit {commit}"),
        }
    }
}

/// Scoped ownership of the working copy for one iteration.
///
/// Call [`release`](Self::release) on every exit path; it returns the restore
/// outcome. Dropping an armed guard (e.g. while unwinding) still restores, but
/// can only log a failure.
pub struct RefStateGuard<'a, V: Vcs + ?Sized> {
    vcs: &'a V,
    state: RefState,
    tooling_submodule: Option<PathBuf>,
    reasserted: Vec<PathBuf>,
    armed: bool,
}

impl<'a, V: Vcs + ?Sized> RefStateGuard<'a, V> {
    pub fn capture(vcs: &'a V, tooling_submodule: Option<&Path>) -> Result<Self> {
        let state = RefState::capture(vcs)?;
        debug!(%state, "captured working copy position");
        Ok(Self {
            vcs,
            state,
            tooling_submodule: tooling_submodule.map(Path::to_path_buf),
            reasserted: Vec::new(),
            armed: false,
        })
    }

    pub fn state(&self) -> &RefState {
        &self.state
    }

    /// True once a checkout has moved the working copy.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Check out `reference`; from here on the guard owes a restore.
    pub fn checkout(&mut self, reference: &str) -> Result<()> {
        self.vcs.checkout(reference)?;
        self.armed = true;
        Ok(())
    }

    /// Paths overwritten from the canonical ref since the checkout.
    ///
    /// They are put back to the checked-out revision before restoring.
    pub fn track_reasserted<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) {
        self.reasserted.extend(paths);
    }

    /// Restore the captured position if anything was checked out.
    pub fn release(mut self) -> Result<()> {
        if !self.armed {
            return Ok(());
        }
        self.armed = false;
        restore(
            self.vcs,
            &self.state,
            self.tooling_submodule.as_deref(),
            &self.reasserted,
        )
    }
}

impl<V: Vcs + ?Sized> Drop for RefStateGuard<'_, V> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        let restored = restore(
            self.vcs,
            &self.state,
            self.tooling_submodule.as_deref(),
            &self.reasserted,
        );
        if let Err(e) = restored {
            error!(state = %self.state, error = %e, "failed to restore working copy");
        }
    }
}

/// Put the working copy back to `state`.
///
/// `reasserted` paths are first reset to the revision being abandoned, and the
/// tooling submodule is refreshed to it, otherwise git refuses the checkout
/// with "local changes would be overwritten". The submodule is refreshed
/// again after the checkout.
pub fn restore<V: Vcs + ?Sized>(
    vcs: &V,
    state: &RefState,
    tooling_submodule: Option<&Path>,
    reasserted: &[PathBuf],
) -> Result<()> {
    for path in reasserted {
        vcs.restore_path(path)?;
    }
    refresh_tooling(vcs, tooling_submodule)?;
    vcs.checkout(state.reference())?;
    refresh_tooling(vcs, tooling_submodule)?;
    info!(%state, "restored working copy");
    Ok(())
}

fn refresh_tooling<V: Vcs + ?Sized>(vcs: &V, tooling_submodule: Option<&Path>) -> Result<()> {
    let Some(submodule) = tooling_submodule else {
        return Ok(());
    };
    match vcs.submodule_update(submodule) {
        Ok(()) => Ok(()),
        Err(e) if is_benign_submodule_failure(&e) => {
            debug!(
                submodule = %submodule.display(),
                error = %e,
                "tooling submodule not present at this revision"
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Combine an iteration's outcome with its restore outcome.
///
/// The iteration's own error wins; if the restore failed as well, both are
/// returned together.
pub fn settle<T>(outcome: Result<T>, restored: Result<()>) -> Result<T> {
    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(r)) => Err(r),
        (Err(e), Err(r)) => Err(DocsError::RestoreAfterFailure {
            build: Box::new(e),
            restore: Box::new(r),
        }),
    }
}
