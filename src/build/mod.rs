//! Turning a catalog version into one generator run.
//!
//! This module provides:
//! - [`SharedBuildOptions`] - settings common to every version
//! - [`BuildInvoker`] - argument assembly and invocation
//! - [`generator`] - the external generator process

pub mod generator;

pub use generator::{ExternalGenerator, Generator};

use std::path::{Path, PathBuf};

use crate::catalog::Version;
use crate::container::{ContainerTool, ContainerToolPolicy};
use crate::error::Result;

/// Options shared by every version's build.
///
/// `None`/`false` options are left out of the argument list so the generator
/// applies its own defaults.
#[derive(Debug, Clone, Default)]
pub struct SharedBuildOptions {
    /// Directory whose `versions/<short_name>` subdirectories receive builds.
    pub repo_root: PathBuf,
    /// URL or absolute path holding the top-level `index.html`.
    pub site_root: String,
    pub conf_path: Option<PathBuf>,
    pub static_path: Option<PathBuf>,
    pub templates_path: Option<PathBuf>,
    pub clean: bool,
    pub build_with_container: bool,
    pub container_tool: Option<ContainerTool>,
}

impl SharedBuildOptions {
    /// Resolve the container tool once, before any version is built.
    ///
    /// Naming a tool implies building in a container. Without either, nothing
    /// is probed.
    pub fn apply_container_policy(
        &mut self,
        policy: &ContainerToolPolicy,
        requested: Option<&str>,
    ) -> Result<()> {
        if !self.build_with_container && requested.is_none() {
            return Ok(());
        }
        self.container_tool = Some(policy.select(requested)?);
        self.build_with_container = true;
        Ok(())
    }
}

/// Builds one version through a [`Generator`].
pub struct BuildInvoker<G: Generator> {
    options: SharedBuildOptions,
    generator: G,
}

impl<G: Generator> BuildInvoker<G> {
    pub fn new(options: SharedBuildOptions, generator: G) -> Self {
        Self { options, generator }
    }

    pub fn options(&self) -> &SharedBuildOptions {
        &self.options
    }

    /// Arguments for building `version`.
    pub fn build_args(&self, version: &Version) -> Vec<String> {
        let opts = &self.options;
        let mut args = vec![
            "--repo-root".to_string(),
            path_arg(&opts.repo_root),
            "--doc-version".to_string(),
            version.short_name().to_string(),
            "--version-display-name".to_string(),
            version.display_name().to_string(),
            "--versions".to_string(),
            "--site-root".to_string(),
            opts.site_root.clone(),
        ];

        if opts.clean {
            args.push("--clean".to_string());
        }
        for (flag, value) in [
            ("--conf-py-path", &opts.conf_path),
            ("--static-path", &opts.static_path),
            ("--templates-path", &opts.templates_path),
        ] {
            if let Some(path) = value {
                args.push(flag.to_string());
                args.push(path_arg(path));
            }
        }
        if opts.build_with_container {
            args.push("--build-with-container".to_string());
        }
        if let Some(tool) = opts.container_tool {
            args.push("--container-cli-tool".to_string());
            args.push(tool.to_string());
        }

        args
    }

    /// Directory the generator writes `version`'s HTML into.
    pub fn output_dir(&self, version: &Version) -> PathBuf {
        self.options
            .repo_root
            .join("versions")
            .join(version.short_name())
            .join("html")
    }

    /// Run the generator for `version` and return its HTML output directory.
    ///
    /// Generator errors are returned as-is.
    pub fn invoke(&self, version: &Version) -> Result<PathBuf> {
        let args = self.build_args(version);
        println!(
            "[docs:{}] {} {}",
            version.short_name(),
            self.generator.program(),
            args.join(" ")
        );
        self.generator.generate(&args)?;
        Ok(self.output_dir(version))
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
