//! Error types for versioned documentation builds.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type for doc-builder operations.
pub type Result<T> = std::result::Result<T, DocsError>;

/// Errors raised while building and publishing documentation versions.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Invalid catalog or settings. Raised before any checkout.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A permanent file is missing or not safe to discard.
    #[error("precondition failed for '{}': {reason}", path.display())]
    Precondition {
        /// Offending path.
        path: PathBuf,
        /// Why the path is not usable.
        reason: String,
    },

    /// A version-control command failed.
    #[error("`{command}` failed: {stderr}")]
    Vcs {
        /// The command line that was run.
        command: String,
        /// Trimmed stderr of the command.
        stderr: String,
    },

    /// The documentation generator exited unsuccessfully.
    #[error("documentation generator `{program}` failed with {status}")]
    Generator {
        /// Generator program.
        program: String,
        /// Exit status of the generator process.
        status: ExitStatus,
    },

    /// The requested container tool is not supported on this host.
    #[error("container tool '{tool}' is only supported on macOS (host platform: {platform})")]
    Platform {
        /// Resolved container tool.
        tool: String,
        /// Host platform name.
        platform: String,
    },

    /// Moving built output into the publication tree failed.
    #[error("publishing '{}' failed", path.display())]
    Publish {
        /// Path being moved or created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The build failed and restoring the working copy afterwards failed too.
    #[error("build failed ({build}); restoring the working copy also failed ({restore})")]
    RestoreAfterFailure {
        /// The original build error.
        build: Box<DocsError>,
        /// The restore error.
        restore: Box<DocsError>,
    },

    /// Any other I/O failure (spawning processes, reading files).
    #[error("{context}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl DocsError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        DocsError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn publish(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocsError::Publish {
            path: path.into(),
            source,
        }
    }
}
