//! Files that must not change between version builds.
//!
//! Build configuration, the Makefile, templates, static assets and the version
//! list are always taken from the canonical reference, so only the document
//! sources differ between versions.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{is_under, resolve_path, DocSourceLayout};
use crate::error::{DocsError, Result};
use crate::vcs::Vcs;

/// Sphinx static directory, relative to the configuration entry point.
pub const DEFAULT_STATIC_DIR: &str = "_static";

/// Sphinx templates directory, relative to the configuration entry point.
pub const DEFAULT_TEMPLATES_DIR: &str = "_templates";

/// A path pinned to the canonical reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermanentFile {
    pub path: PathBuf,
    pub canonical_ref: String,
}

/// Paths handled by [`PermanentFileGuard::reassert`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reasserted {
    pub restored: Vec<PathBuf>,
    /// Paths tracked by another repository (submodule or unrelated tree).
    pub skipped: Vec<PathBuf>,
}

/// The declared set of permanent files for one iteration.
#[derive(Debug, Clone)]
pub struct PermanentFileGuard {
    files: Vec<PermanentFile>,
}

impl PermanentFileGuard {
    pub fn new(files: Vec<PermanentFile>) -> Self {
        Self { files }
    }

    /// Pin every path in `paths` to `canonical_ref`.
    pub fn from_paths<I, P>(paths: I, canonical_ref: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(
            paths
                .into_iter()
                .map(|path| PermanentFile {
                    path: path.into(),
                    canonical_ref: canonical_ref.to_string(),
                })
                .collect(),
        )
    }

    /// List the permanent files of a documentation source tree.
    ///
    /// The version list, configuration entry point and Makefile must exist, as
    /// must any explicitly requested static/templates directory and the tooling
    /// submodule. Default static/templates directories are included only when
    /// present.
    pub fn enumerate(layout: &DocSourceLayout, canonical_ref: &str) -> Result<Self> {
        let mut paths = Vec::new();

        for required in [&layout.version_list, &layout.conf_path, &layout.makefile] {
            paths.push(require_exists(required)?);
        }

        let conf_dir = layout.conf_dir();
        for (explicit, default_dir) in [
            (&layout.static_path, DEFAULT_STATIC_DIR),
            (&layout.templates_path, DEFAULT_TEMPLATES_DIR),
        ] {
            match explicit {
                Some(path) => paths.push(require_exists(&resolve_path(&conf_dir, path))?),
                None => {
                    let candidate = conf_dir.join(default_dir);
                    if candidate.exists() {
                        paths.push(candidate);
                    } else {
                        debug!(path = %candidate.display(), "no default directory; not pinned");
                    }
                }
            }
        }

        if let Some(submodule) = &layout.tooling_submodule {
            paths.push(require_exists(&resolve_path(&layout.source_dir, submodule))?);
        }

        let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }

        Ok(Self::from_paths(unique, canonical_ref))
    }

    pub fn files(&self) -> &[PermanentFile] {
        &self.files
    }

    /// Fail if any permanent file lies outside the working copy or has
    /// changes a checkout could destroy.
    pub fn check_all_clean<V: Vcs + ?Sized>(&self, vcs: &V) -> Result<()> {
        let toplevel = vcs.toplevel()?;
        for file in &self.files {
            check_within(&toplevel, &file.path)?;
        }
        for file in &self.files {
            check_clean(vcs, &file.path)?;
        }
        Ok(())
    }

    /// Re-check-out every permanent file from its canonical reference.
    ///
    /// Paths whose repository top-level is not the working copy's are skipped:
    /// forcing a submodule's path against the outer repository's reference
    /// would clobber the submodule's own history.
    pub fn reassert<V: Vcs + ?Sized>(&self, vcs: &V) -> Result<Reasserted> {
        let mut outcome = Reasserted::default();
        self.reassert_into(vcs, &mut outcome)?;
        Ok(outcome)
    }

    /// [`reassert`](Self::reassert), recording progress in `outcome` so a
    /// caller can still see what was overwritten when a later path fails.
    pub fn reassert_into<V: Vcs + ?Sized>(
        &self,
        vcs: &V,
        outcome: &mut Reasserted,
    ) -> Result<()> {
        let toplevel = vcs.toplevel()?;

        for file in &self.files {
            match vcs.toplevel_of(&file.path)? {
                Some(owner) if owner == toplevel => {
                    vcs.checkout_path(&file.canonical_ref, &file.path)?;
                    outcome.restored.push(file.path.clone());
                }
                owner => {
                    warn!(
                        path = %file.path.display(),
                        owner = ?owner,
                        "not reasserting permanent file tracked outside the working copy"
                    );
                    outcome.skipped.push(file.path.clone());
                }
            }
        }

        Ok(())
    }
}

/// Fail with a precondition error unless `path` is clean.
pub fn check_clean<V: Vcs + ?Sized>(vcs: &V, path: &Path) -> Result<()> {
    if vcs.is_clean(path)? {
        return Ok(());
    }
    Err(DocsError::Precondition {
        path: path.to_path_buf(),
        reason: "important file/submodule may contain uncommitted changes".to_string(),
    })
}

/// Permanent files must live inside the working copy; nested repositories
/// such as submodules sit below its top-level too.
fn check_within(toplevel: &Path, path: &Path) -> Result<()> {
    if is_under(&resolve_path(toplevel, path), toplevel) {
        return Ok(());
    }
    Err(DocsError::Configuration(format!(
        "permanent file '{}' is outside the working copy '{}'",
        path.display(),
        toplevel.display()
    )))
}

fn require_exists(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    Err(DocsError::Precondition {
        path: path.to_path_buf(),
        reason: "permanent file not found".to_string(),
    })
}
