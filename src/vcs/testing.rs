//! Scratch git repositories for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

const GIT_TEST_CONFIG: &[&str] = &[
    "-c",
    "user.name=doc-builder tests",
    "-c",
    "user.email=tests@example.invalid",
    "-c",
    "commit.gpgsign=false",
    "-c",
    "init.defaultBranch=main",
    "-c",
    "protocol.file.allow=always",
];

/// Run git in `dir`, panicking with stderr on failure.
pub(crate) fn git_in(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(GIT_TEST_CONFIG)
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("spawning git");
    assert!(
        output.status.success(),
        "git {} failed in {}:\n{}",
        args.join(" "),
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A fresh repository on branch `main` inside a temporary directory.
pub(crate) struct GitFixture {
    _temp: TempDir,
    path: PathBuf,
}

impl GitFixture {
    pub(crate) fn new() -> Self {
        let temp = TempDir::new().unwrap();
        // git reports resolved paths; keep fixtures comparable with them.
        let path = temp.path().canonicalize().unwrap().join("repo");
        fs::create_dir_all(&path).unwrap();
        git_in(&path, &["init", "-q"]);
        git_in(&path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        Self { _temp: temp, path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn git(&self, args: &[&str]) -> String {
        git_in(&self.path, args)
    }

    /// Write `contents` to `rel` and commit it.
    pub(crate) fn commit_file(&self, rel: &str, contents: &str) {
        let file = self.path.join(rel);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file, contents).unwrap();
        self.git(&["add", rel]);
        self.git(&["commit", "-q", "-m", &format!("update {rel}")]);
    }

    /// Add `source` as a submodule at `rel` and commit the gitlink.
    pub(crate) fn add_submodule(&self, source: &GitFixture, rel: &str) {
        let url = source.path().to_string_lossy().into_owned();
        self.git(&["submodule", "add", "-q", &url, rel]);
        self.git(&["commit", "-q", "-m", &format!("add submodule {rel}")]);
    }

    pub(crate) fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub(crate) fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }
}
