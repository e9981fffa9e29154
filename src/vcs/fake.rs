//! In-memory [`Vcs`] for exercising the guards and the build loop.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::Vcs;
use crate::error::{DocsError, Result};

pub(crate) const FAKE_ROOT: &str = "/work/docs";

#[derive(Debug, Default)]
struct FakeState {
    root: PathBuf,
    branches: BTreeMap<String, String>,
    branch: Option<String>,
    head: String,
    dirty: BTreeSet<PathBuf>,
    foreign: BTreeSet<PathBuf>,
    failing_checkouts: BTreeSet<String>,
    failing_paths: BTreeSet<PathBuf>,
    submodule_stderr: Option<String>,
    log: Vec<String>,
}

/// Records every command; checkouts move a simulated HEAD.
#[derive(Debug)]
pub(crate) struct FakeVcs {
    state: RefCell<FakeState>,
}

impl FakeVcs {
    /// Working copy on `branch`, with the given other branches known.
    pub(crate) fn on_branch(branch: &str, others: &[&str]) -> Self {
        let mut state = FakeState::default();
        for name in std::iter::once(branch).chain(others.iter().copied()) {
            state
                .branches
                .insert(name.to_string(), format!("{name}-commit"));
        }
        state.root = PathBuf::from(FAKE_ROOT);
        state.branch = Some(branch.to_string());
        state.head = format!("{branch}-commit");
        Self {
            state: RefCell::new(state),
        }
    }

    /// Report `root` as the working copy top-level.
    pub(crate) fn with_root(self, root: &Path) -> Self {
        self.state.borrow_mut().root = root.to_path_buf();
        self
    }

    pub(crate) fn mark_dirty(&self, path: &str) {
        self.state.borrow_mut().dirty.insert(PathBuf::from(path));
    }

    /// Treat `path` as living in another repository (e.g. a submodule).
    pub(crate) fn mark_foreign(&self, path: &str) {
        self.state.borrow_mut().foreign.insert(PathBuf::from(path));
    }

    pub(crate) fn fail_checkout_of(&self, reference: &str) {
        self.state
            .borrow_mut()
            .failing_checkouts
            .insert(reference.to_string());
    }

    pub(crate) fn fail_checkout_path(&self, path: &str) {
        self.state
            .borrow_mut()
            .failing_paths
            .insert(PathBuf::from(path));
    }

    pub(crate) fn fail_submodule_update(&self, stderr: &str) {
        self.state.borrow_mut().submodule_stderr = Some(stderr.to_string());
    }

    /// Branch name, or commit id when detached.
    pub(crate) fn position(&self) -> String {
        let state = self.state.borrow();
        state.branch.clone().unwrap_or_else(|| state.head.clone())
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    /// Log entries that changed the working copy.
    pub(crate) fn mutations(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter(|entry| {
                ["checkout", "restore", "submodule"]
                    .iter()
                    .any(|verb| entry.starts_with(verb))
            })
            .collect()
    }

    fn record(&self, entry: String) {
        self.state.borrow_mut().log.push(entry);
    }
}

impl Vcs for FakeVcs {
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.state.borrow().branch.clone())
    }

    fn head_commit(&self) -> Result<String> {
        Ok(self.state.borrow().head.clone())
    }

    fn checkout(&self, reference: &str) -> Result<()> {
        self.record(format!("checkout {reference}"));
        let mut state = self.state.borrow_mut();
        if state.failing_checkouts.contains(reference) {
            return Err(DocsError::Vcs {
                command: format!("git checkout {reference}"),
                stderr: "error: Your local changes to the following files would be \
                         overwritten by checkout"
                    .into(),
            });
        }
        match state.branches.get(reference).cloned() {
            Some(commit) => {
                state.branch = Some(reference.to_string());
                state.head = commit;
            }
            None => {
                state.branch = None;
                state.head = reference.to_string();
            }
        }
        Ok(())
    }

    fn checkout_path(&self, reference: &str, path: &Path) -> Result<()> {
        self.record(format!("checkout {reference} -- {}", path.display()));
        if self.state.borrow().failing_paths.contains(path) {
            return Err(DocsError::Vcs {
                command: format!("git checkout {reference} -- {}", path.display()),
                stderr: format!("error: pathspec '{}' did not match", path.display()),
            });
        }
        Ok(())
    }

    fn restore_path(&self, path: &Path) -> Result<()> {
        self.record(format!("restore {}", path.display()));
        Ok(())
    }

    fn submodule_update(&self, submodule: &Path) -> Result<()> {
        self.record(format!("submodule update --checkout {}", submodule.display()));
        match &self.state.borrow().submodule_stderr {
            Some(stderr) => Err(DocsError::Vcs {
                command: format!("git submodule update --checkout {}", submodule.display()),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }

    fn is_clean(&self, path: &Path) -> Result<bool> {
        self.record(format!("status {}", path.display()));
        Ok(!self.state.borrow().dirty.contains(path))
    }

    fn toplevel(&self) -> Result<PathBuf> {
        Ok(self.state.borrow().root.clone())
    }

    fn toplevel_of(&self, path: &Path) -> Result<Option<PathBuf>> {
        let state = self.state.borrow();
        if state.foreign.contains(path) {
            return Ok(Some(state.root.join(path)));
        }
        Ok(Some(state.root.clone()))
    }
}
