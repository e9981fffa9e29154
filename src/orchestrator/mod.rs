//! The per-version build loop.
//!
//! Each iteration walks:
//!
//! ```text
//! Captured -> CheckedOut -> Built | Failed -> Restored -> Published | Skipped
//! ```
//!
//! A precondition failure stops at `Captured` without touching the working
//! copy. Once something has been checked out, the working copy is restored
//! before the iteration returns, whatever happened in between.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::build::{BuildInvoker, Generator};
use crate::catalog::{Version, VersionCatalog};
use crate::config::{resolve_path, DocSourceLayout};
use crate::container::ContainerToolPolicy;
use crate::error::Result;
use crate::guard::ref_state::settle;
use crate::guard::{PermanentFileGuard, Reasserted, RefStateGuard};
use crate::publish::ArtifactPublisher;
use crate::vcs::Vcs;

/// Where an iteration got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationState {
    Captured,
    CheckedOut,
    Built,
    Failed,
    Restored,
    Published,
    Skipped,
}

impl fmt::Display for IterationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IterationState::Captured => "captured",
            IterationState::CheckedOut => "checked-out",
            IterationState::Built => "built",
            IterationState::Failed => "failed",
            IterationState::Restored => "restored",
            IterationState::Published => "published",
            IterationState::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// What to do after a version's generator run fails.
///
/// Only generator failures are subject to the policy. Precondition, checkout
/// (including re-checking-out permanent files), restore and publish failures
/// always end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    HaltOnFirstError,
    ContinueOnError,
}

/// Final state of one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOutcome {
    pub short_name: String,
    pub state: IterationState,
    pub destination: Option<PathBuf>,
    pub error: Option<String>,
}

/// Outcomes in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<VersionOutcome>,
}

impl RunReport {
    pub fn published(&self) -> impl Iterator<Item = &VersionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.state == IterationState::Published)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &VersionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.state == IterationState::Skipped)
    }
}

/// Drives the catalog through checkout, build, restore and publish.
pub struct Orchestrator<'a, V: Vcs + ?Sized, G: Generator> {
    vcs: &'a V,
    layout: DocSourceLayout,
    invoker: BuildInvoker<G>,
    publisher: ArtifactPublisher,
    policy: FailurePolicy,
    container_policy: ContainerToolPolicy,
}

impl<'a, V: Vcs + ?Sized, G: Generator> Orchestrator<'a, V, G> {
    pub fn new(
        vcs: &'a V,
        layout: DocSourceLayout,
        invoker: BuildInvoker<G>,
        publisher: ArtifactPublisher,
    ) -> Self {
        Self {
            vcs,
            layout,
            invoker,
            publisher,
            policy: FailurePolicy::default(),
            container_policy: ContainerToolPolicy::for_host(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Policy the configured container tool is checked against.
    pub fn with_container_policy(mut self, policy: ContainerToolPolicy) -> Self {
        self.container_policy = policy;
        self
    }

    /// Build and publish every version, strictly in catalog order.
    ///
    /// The catalog and container tool are checked before any version starts.
    pub fn run(&self, catalog: VersionCatalog) -> Result<RunReport> {
        catalog.validate()?;
        if let Some(tool) = self.invoker.options().container_tool {
            self.container_policy.validate(tool)?;
        }

        let canonical_ref = catalog.canonical_ref().to_string();
        let mut layout = self.layout.clone();
        if let Some(submodule) = catalog.tooling_submodule() {
            layout.tooling_submodule = Some(resolve_path(&layout.source_dir, submodule));
        }

        let mut report = RunReport::default();
        for version in catalog.iterate() {
            let mut state = IterationState::Captured;
            match self.run_iteration(&version, &layout, &canonical_ref, &mut state) {
                Ok(destination) => report.outcomes.push(VersionOutcome {
                    short_name: version.short_name().to_string(),
                    state,
                    destination: Some(destination),
                    error: None,
                }),
                Err(e)
                    if state == IterationState::Skipped
                        && self.policy == FailurePolicy::ContinueOnError =>
                {
                    let name = version.short_name();
                    warn!(version = name, error = %e, "build failed; continuing");
                    println!("[docs:{name}] build failed, skipped: {e}");
                    report.outcomes.push(VersionOutcome {
                        short_name: version.short_name().to_string(),
                        state,
                        destination: None,
                        error: Some(e.to_string()),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    fn run_iteration(
        &self,
        version: &Version,
        layout: &DocSourceLayout,
        canonical_ref: &str,
        state: &mut IterationState,
    ) -> Result<PathBuf> {
        let name = version.short_name();

        let mut guard = RefStateGuard::capture(self.vcs, layout.tooling_submodule.as_deref())?;
        transition(name, state, IterationState::Captured);
        debug!(version = name, from = %guard.state(), "captured");

        let permanent = PermanentFileGuard::enumerate(layout, canonical_ref)?;
        permanent.check_all_clean(self.vcs)?;

        println!(
            "[docs:{name}] building '{}' from {}",
            version.display_name(),
            version.reference()
        );
        guard.checkout(version.reference())?;
        transition(name, state, IterationState::CheckedOut);

        let mut reasserted = Reasserted::default();
        let pinned = permanent.reassert_into(self.vcs, &mut reasserted);
        guard.track_reasserted(reasserted.restored.iter().cloned());
        if let Err(e) = pinned {
            let restored = guard.release();
            if restored.is_ok() {
                transition(name, state, IterationState::Restored);
            }
            return settle(Err(e), restored);
        }
        debug!(
            version = name,
            restored = reasserted.restored.len(),
            skipped = reasserted.skipped.len(),
            canonical_ref,
            "reasserted permanent files"
        );

        let built = self.invoker.invoke(version);
        transition(
            name,
            state,
            if built.is_ok() {
                IterationState::Built
            } else {
                IterationState::Failed
            },
        );

        let restored = guard.release();
        if restored.is_ok() {
            transition(name, state, IterationState::Restored);
        }
        let output = match settle(built, restored) {
            Ok(output) => output,
            Err(e) => {
                if *state == IterationState::Restored {
                    transition(name, state, IterationState::Skipped);
                }
                return Err(e);
            }
        };

        let destination = self.publisher.publish(version, &output)?;
        transition(name, state, IterationState::Published);
        println!("[docs:{name}] published to {}", destination.display());
        Ok(destination)
    }
}

fn transition(version: &str, state: &mut IterationState, next: IterationState) {
    info!(version, from = %state, to = %next, "iteration state");
    *state = next;
}
