use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::Vcs;
use crate::error::{DocsError, Result};

/// A git working copy driven through the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitWorkingCopy {
    root: PathBuf,
}

impl GitWorkingCopy {
    /// Use `root` as the working copy; relative paths are resolved against it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the working copy that contains `start`.
    pub fn discover(start: &Path) -> Result<Self> {
        let root = git_output(start, ["rev-parse", "--show-toplevel"])?;
        Ok(Self::new(root.trim()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        git_output(&self.root, args)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Vcs for GitWorkingCopy {
    fn current_branch(&self) -> Result<Option<String>> {
        // Exits non-zero when HEAD is detached.
        match self.run(["symbolic-ref", "--short", "-q", "HEAD"]) {
            Ok(out) => {
                let branch = out.trim();
                Ok((!branch.is_empty()).then(|| branch.to_string()))
            }
            Err(DocsError::Vcs { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn head_commit(&self) -> Result<String> {
        Ok(self.run(["rev-parse", "HEAD"])?.trim().to_string())
    }

    fn checkout(&self, reference: &str) -> Result<()> {
        self.run(["checkout", reference]).map(|_| ())
    }

    fn checkout_path(&self, reference: &str, path: &Path) -> Result<()> {
        self.run([
            OsStr::new("checkout"),
            OsStr::new(reference),
            OsStr::new("--"),
            path.as_os_str(),
        ])
        .map(|_| ())
    }

    fn restore_path(&self, path: &Path) -> Result<()> {
        self.run([
            OsStr::new("restore"),
            OsStr::new("--source=HEAD"),
            OsStr::new("--staged"),
            OsStr::new("--worktree"),
            OsStr::new("--"),
            path.as_os_str(),
        ])
        .map(|_| ())
    }

    fn submodule_update(&self, submodule: &Path) -> Result<()> {
        self.run([
            OsStr::new("submodule"),
            OsStr::new("update"),
            OsStr::new("--checkout"),
            submodule.as_os_str(),
        ])
        .map(|_| ())
    }

    fn is_clean(&self, path: &Path) -> Result<bool> {
        let status = self.run([
            OsStr::new("status"),
            OsStr::new("--porcelain"),
            OsStr::new("--untracked-files=all"),
            OsStr::new("--"),
            path.as_os_str(),
        ])?;
        Ok(status.trim().is_empty())
    }

    fn toplevel(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(
            self.run(["rev-parse", "--show-toplevel"])?.trim(),
        ))
    }

    fn toplevel_of(&self, path: &Path) -> Result<Option<PathBuf>> {
        let absolute = self.absolute(path);
        let Some(dir) = absolute.ancestors().find(|p| p.is_dir()) else {
            return Ok(None);
        };
        match git_output(dir, ["rev-parse", "--show-toplevel"]) {
            Ok(out) => Ok(Some(PathBuf::from(out.trim()))),
            Err(DocsError::Vcs { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn git_output<I, S>(dir: &Path, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
    let command_line = format!(
        "git {}",
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    debug!(dir = %dir.display(), command = %command_line, "running git");

    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(&args)
        .output()
        .map_err(|e| DocsError::io(format!("running `{command_line}`"), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(DocsError::Vcs {
            command: command_line,
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
