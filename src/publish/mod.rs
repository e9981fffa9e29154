//! Moving finished builds into the publication tree.
//!
//! ```text
//! <publish_root>/            <- landing version's HTML
//! <publish_root>/<short>/    <- every other version
//! ```
//!
//! Moves are not transactional: if one entry fails, entries already moved stay
//! where they are and a rerun will find a partially populated destination.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::catalog::Version;
use crate::error::{DocsError, Result};

/// Places built versions under a publication root.
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    publish_root: PathBuf,
}

impl ArtifactPublisher {
    pub fn new(publish_root: impl Into<PathBuf>) -> Self {
        Self {
            publish_root: publish_root.into(),
        }
    }

    pub fn publish_root(&self) -> &Path {
        &self.publish_root
    }

    /// Where `version` is published.
    pub fn destination(&self, version: &Version) -> PathBuf {
        if version.is_landing_version() {
            self.publish_root.clone()
        } else {
            self.publish_root.join(version.short_name())
        }
    }

    /// Move every entry of `built_output_dir` into `version`'s destination.
    pub fn publish(&self, version: &Version, built_output_dir: &Path) -> Result<PathBuf> {
        if !built_output_dir.is_dir() {
            return Err(DocsError::publish(
                built_output_dir,
                io::Error::new(io::ErrorKind::NotFound, "build output directory missing"),
            ));
        }

        let destination = self.destination(version);
        fs::create_dir_all(&destination).map_err(|e| DocsError::publish(&destination, e))?;

        let entries =
            fs::read_dir(built_output_dir).map_err(|e| DocsError::publish(built_output_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| DocsError::publish(built_output_dir, e))?;
            let target = destination.join(entry.file_name());
            if target.exists() || target.is_symlink() {
                return Err(DocsError::publish(
                    &target,
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "destination entry already exists",
                    ),
                ));
            }
            move_entry(&entry.path(), &target)?;
        }

        info!(
            version = version.short_name(),
            destination = %destination.display(),
            "published"
        );
        Ok(destination)
    }
}

/// Rename `src` to `dst`, falling back to copy + remove across filesystems.
fn move_entry(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(src = %src.display(), error = %e, "rename failed; copying instead");
            copy_recursive(src, dst)?;
            let removed = if src.is_dir() && !src.is_symlink() {
                fs::remove_dir_all(src)
            } else {
                fs::remove_file(src)
            };
            removed.map_err(|e| DocsError::publish(src, e))
        }
    }
}

/// Copy a file, symlink or directory tree, preserving symlinks.
fn copy_recursive(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            DocsError::publish(path, io::Error::other(e.to_string()))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| DocsError::publish(entry.path(), io::Error::other(e.to_string())))?;
        let target = if relative.as_os_str().is_empty() {
            dst.to_path_buf()
        } else {
            dst.join(relative)
        };

        let file_type = entry.file_type();
        let copied = if file_type.is_symlink() {
            fs::read_link(entry.path())
                .and_then(|link| std::os::unix::fs::symlink(link, &target))
        } else if file_type.is_dir() {
            fs::create_dir_all(&target)
        } else {
            fs::copy(entry.path(), &target).map(|_| ())
        };
        copied.map_err(|e| DocsError::publish(&target, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn built(dir: &Path, marker: &str) -> PathBuf {
        let html = dir.join(marker).join("html");
        fs::create_dir_all(html.join("_static")).unwrap();
        fs::write(html.join("index.html"), marker).unwrap();
        fs::write(html.join("_static/style.css"), "body {}").unwrap();
        html
    }

    #[test]
    fn landing_version_goes_to_root_others_to_subdir() {
        let temp = TempDir::new().unwrap();
        let publish_root = temp.path().join("publish");
        let publisher = ArtifactPublisher::new(&publish_root);

        let v1 = Version::new("v1", "v1", "v1", false);
        let latest = Version::new("main", "latest", "Latest", true);

        let v1_out = built(temp.path(), "v1");
        let latest_out = built(temp.path(), "latest");

        assert_eq!(publisher.publish(&v1, &v1_out).unwrap(), publish_root.join("v1"));
        assert_eq!(publisher.publish(&latest, &latest_out).unwrap(), publish_root);

        assert_eq!(fs::read_to_string(publish_root.join("index.html")).unwrap(), "latest");
        assert_eq!(fs::read_to_string(publish_root.join("v1/index.html")).unwrap(), "v1");
        assert!(publish_root.join("v1/_static/style.css").is_file());
        assert!(!latest_out.join("index.html").exists());
        assert_eq!(fs::read_dir(&v1_out).unwrap().count(), 0);
    }

    #[test]
    fn missing_build_output_is_an_error() {
        let temp = TempDir::new().unwrap();
        let publisher = ArtifactPublisher::new(temp.path().join("publish"));
        let version = Version::new("v1", "v1", "v1", false);

        let err = publisher
            .publish(&version, &temp.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, DocsError::Publish { .. }));
    }

    #[test]
    fn existing_destination_entry_is_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let publish_root = temp.path().join("publish");
        fs::create_dir_all(publish_root.join("v1")).unwrap();
        fs::write(publish_root.join("v1/index.html"), "stale").unwrap();

        let publisher = ArtifactPublisher::new(&publish_root);
        let version = Version::new("v1", "v1", "v1", false);
        let err = publisher.publish(&version, &built(temp.path(), "v1")).unwrap_err();

        assert!(matches!(
            err,
            DocsError::Publish { ref path, .. } if path.ends_with("v1/index.html")
        ));
        assert_eq!(fs::read_to_string(publish_root.join("v1/index.html")).unwrap(), "stale");
    }

    #[test]
    fn copy_recursive_preserves_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(src.join("subdir")).unwrap();
        fs::write(src.join("file.txt"), "hello").unwrap();
        fs::write(src.join("subdir/nested.txt"), "world").unwrap();
        std::os::unix::fs::symlink("file.txt", src.join("link")).unwrap();

        copy_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("subdir/nested.txt")).unwrap(), "world");
        assert!(dst.join("link").is_symlink());
        assert_eq!(fs::read_link(dst.join("link")).unwrap(), PathBuf::from("file.txt"));
    }
}
