//! Layout of the documentation source tree and run settings.

use std::env;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::catalog::DEFAULT_VERSION_LIST;
use crate::error::{DocsError, Result};

/// Default directory the generator builds into, relative to the current dir.
pub const DEFAULT_REPO_ROOT: &str = "_build";

/// Default publication directory, relative to the current dir.
pub const DEFAULT_PUBLISH_DIR: &str = "_publish";

/// Overrides the version list location.
pub const VERSION_LIST_ENV: &str = "DOC_BUILDER_VERSION_LIST";

/// Conventional locations of the Sphinx configuration entry point.
const CONF_CANDIDATES: &[&str] = &["conf.py", "source/conf.py"];

/// Where the permanent files of a documentation source tree live.
///
/// All paths are absolute once built through [`DocSourceLayout::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocSourceLayout {
    /// Directory holding the documentation Makefile.
    pub source_dir: PathBuf,
    pub version_list: PathBuf,
    /// `conf.py`, or the directory containing it.
    pub conf_path: PathBuf,
    pub makefile: PathBuf,
    /// Relative to the configuration directory unless absolute.
    pub static_path: Option<PathBuf>,
    /// Relative to the configuration directory unless absolute.
    pub templates_path: Option<PathBuf>,
    /// Relative to `source_dir` unless absolute.
    pub tooling_submodule: Option<PathBuf>,
}

impl DocSourceLayout {
    pub fn new(source_dir: &Path) -> Self {
        let version_list = env::var_os(VERSION_LIST_ENV)
            .map(PathBuf::from)
            .map(|p| resolve_path(source_dir, &p))
            .unwrap_or_else(|| source_dir.join(DEFAULT_VERSION_LIST));

        let conf_path = CONF_CANDIDATES
            .iter()
            .map(|candidate| source_dir.join(candidate))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| source_dir.join(CONF_CANDIDATES[1]));

        Self {
            source_dir: source_dir.to_path_buf(),
            version_list,
            conf_path,
            makefile: source_dir.join("Makefile"),
            static_path: None,
            templates_path: None,
            tooling_submodule: None,
        }
    }

    pub fn with_conf_path(mut self, conf_path: &Path) -> Self {
        self.conf_path = resolve_path(&self.source_dir, conf_path);
        self
    }

    /// Directory that static/templates paths are resolved against.
    pub fn conf_dir(&self) -> PathBuf {
        if self.conf_path.is_dir() {
            return self.conf_path.clone();
        }
        self.conf_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.source_dir.clone())
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// `--site-root` must be a web URL or an absolute path.
pub fn validate_site_root(site_root: &str) -> Result<()> {
    if let Ok(url) = Url::parse(site_root) {
        if url.has_host() && matches!(url.scheme(), "http" | "https") {
            return Ok(());
        }
    }
    if Path::new(site_root).is_absolute() {
        return Ok(());
    }
    Err(DocsError::Configuration(format!(
        "--site-root is neither a web URL nor an absolute path: '{site_root}'"
    )))
}

/// Lexically check that `child` is `parent` or lies below it.
///
/// Neither path has to exist; `.` and `..` components are folded first.
pub fn is_under(child: &Path, parent: &Path) -> bool {
    normalize(child).starts_with(normalize(parent))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The publication directory must not sit inside the generator's output tree,
/// or publishing would move a build into itself.
pub fn validate_publish_dir(publish_root: &Path, repo_root: &Path) -> Result<()> {
    let versions_dir = repo_root.join("versions");
    if is_under(publish_root, &versions_dir) {
        return Err(DocsError::Configuration(format!(
            "publish directory '{}' must not be inside '{}'",
            publish_root.display(),
            versions_dir.display()
        )));
    }
    Ok(())
}
