//! Version-control command surface.
//!
//! Everything that touches the shared working copy goes through [`Vcs`], so the
//! guards and the orchestrator can be exercised against an in-memory fake.

mod git;

#[cfg(test)]
pub(crate) mod fake;
#[cfg(test)]
pub(crate) mod testing;

pub use git::GitWorkingCopy;

use std::path::{Path, PathBuf};

use crate::error::{DocsError, Result};

/// Submodule-update failures that mean "there is no such submodule here".
///
/// Older revisions may predate the tooling submodule, so these are tolerated
/// for the submodule refresh and nowhere else.
pub const BENIGN_SUBMODULE_FAILURES: &[&str] = &[
    "not tracked by version control",
    "did not match any file(s) known to git",
];

/// Operations the build loop needs from the version-control layer.
///
/// All calls block until the underlying command finishes. Relative paths are
/// resolved against the working copy root.
pub trait Vcs {
    /// Current branch name, or `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Commit id of HEAD.
    fn head_commit(&self) -> Result<String>;

    /// `checkout <reference>`
    fn checkout(&self, reference: &str) -> Result<()>;

    /// `checkout <reference> -- <path>`
    fn checkout_path(&self, reference: &str, path: &Path) -> Result<()>;

    /// `restore --source=HEAD --staged --worktree -- <path>`
    ///
    /// Drops index and worktree changes under `path`, removing entries that
    /// HEAD does not track.
    fn restore_path(&self, path: &Path) -> Result<()>;

    /// `submodule update --checkout <submodule>`
    fn submodule_update(&self, submodule: &Path) -> Result<()>;

    /// True when `path` has no untracked, modified or staged content.
    fn is_clean(&self, path: &Path) -> Result<bool>;

    /// Top-level directory of the working copy.
    fn toplevel(&self) -> Result<PathBuf>;

    /// Top-level directory of the repository that tracks `path`, if any.
    fn toplevel_of(&self, path: &Path) -> Result<Option<PathBuf>>;
}

/// True when a submodule-update failure only says the submodule is absent.
pub fn is_benign_submodule_failure(err: &DocsError) -> bool {
    match err {
        DocsError::Vcs { stderr, .. } => BENIGN_SUBMODULE_FAILURES
            .iter()
            .any(|needle| stderr.contains(needle)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_submodule_failures_are_recognised() {
        let err = DocsError::Vcs {
            command: "git submodule update --checkout doc-builder".into(),
            stderr: "error: pathspec 'doc-builder' did not match any file(s) known to git".into(),
        };
        assert!(is_benign_submodule_failure(&err));

        let err = DocsError::Vcs {
            command: "git submodule update --checkout doc-builder".into(),
            stderr: "fatal: unable to access remote".into(),
        };
        assert!(!is_benign_submodule_failure(&err));

        let err = DocsError::Configuration("not tracked by version control".into());
        assert!(!is_benign_submodule_failure(&err));
    }
}
