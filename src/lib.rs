//! Multi-version documentation builds from a single git working copy.
//!
//! For every version in the catalog, the working copy is moved to that
//! version's ref, the build configuration is forced back to the canonical
//! ref, an external generator renders HTML, and the working copy is put back
//! exactly where it started before the next version begins.
//!
//! - **Catalog** - ordered versions and the canonical ref ([`catalog`])
//! - **Guards** - working-copy position and permanent files ([`guard`])
//! - **Build** - generator argument assembly and invocation ([`build`])
//! - **Publish** - moving built HTML into the site tree ([`publish`])
//! - **Orchestrator** - the per-version state machine ([`orchestrator`])
//!
//! # Architecture
//!
//! ```text
//! build-docs-to-publish (bin)
//!     │
//!     ├── preflight, config, container   (before the loop)
//!     │
//!     └── Orchestrator::run(catalog)
//!             │
//!             ├── RefStateGuard       capture / checkout / restore
//!             ├── PermanentFileGuard  check clean / reassert
//!             ├── BuildInvoker        -> Generator
//!             └── ArtifactPublisher
//!                     │
//!                     Vcs (GitWorkingCopy)
//! ```

pub mod build;
pub mod catalog;
pub mod config;
pub mod container;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod preflight;
pub mod publish;
pub mod vcs;

pub use build::{BuildInvoker, ExternalGenerator, Generator, SharedBuildOptions};
pub use catalog::{Version, VersionCatalog};
pub use error::{DocsError, Result};
pub use orchestrator::{FailurePolicy, Orchestrator, RunReport};
pub use publish::ArtifactPublisher;
pub use vcs::{GitWorkingCopy, Vcs};
