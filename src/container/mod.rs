//! Container tool selection for builds that run the generator in a container.
//!
//! The policy is pure apart from the `PATH` probe, which is injectable, so it
//! can be checked without spawning anything.

use std::fmt;
use std::str::FromStr;

use crate::error::{DocsError, Result};

/// Supported container CLIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerTool {
    Docker,
    Podman,
}

impl ContainerTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerTool::Docker => "docker",
            ContainerTool::Podman => "podman",
        }
    }
}

impl fmt::Display for ContainerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerTool {
    type Err = DocsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(ContainerTool::Docker),
            "podman" => Ok(ContainerTool::Podman),
            other => Err(DocsError::Configuration(format!(
                "unsupported container tool '{other}'; expected 'docker' or 'podman'"
            ))),
        }
    }
}

/// Host platform, as far as container policy cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPlatform {
    MacOs,
    Other(String),
}

impl HostPlatform {
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Other(std::env::consts::OS.to_string())
        }
    }

    /// Tools in decreasing order of preference.
    ///
    /// Podman first on macOS since Docker Desktop is not always free; Docker
    /// Engine first elsewhere.
    pub fn preferred_tools(&self) -> [ContainerTool; 2] {
        match self {
            HostPlatform::MacOs => [ContainerTool::Podman, ContainerTool::Docker],
            HostPlatform::Other(_) => [ContainerTool::Docker, ContainerTool::Podman],
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPlatform::MacOs => f.write_str("macos"),
            HostPlatform::Other(name) => f.write_str(name),
        }
    }
}

/// Resolves and validates the container tool for a run.
pub struct ContainerToolPolicy {
    platform: HostPlatform,
    probe: Box<dyn Fn(&str) -> bool>,
}

impl ContainerToolPolicy {
    /// Policy for this host, probing `PATH` with `which`.
    pub fn for_host() -> Self {
        Self::new(HostPlatform::detect(), |tool| which::which(tool).is_ok())
    }

    pub fn new(platform: HostPlatform, probe: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            platform,
            probe: Box::new(probe),
        }
    }

    pub fn platform(&self) -> &HostPlatform {
        &self.platform
    }

    /// Use `requested` if given, otherwise the first installed tool.
    pub fn resolve(&self, requested: Option<&str>) -> Result<ContainerTool> {
        if let Some(name) = requested {
            return name.parse();
        }
        let candidates = self.platform.preferred_tools();
        candidates
            .iter()
            .copied()
            .find(|tool| (self.probe)(tool.as_str()))
            .ok_or_else(|| {
                DocsError::Configuration(format!(
                    "no compatible container software found: {}",
                    candidates.map(|t| t.as_str()).join(", ")
                ))
            })
    }

    /// Podman builds are only supported on macOS.
    pub fn validate(&self, tool: ContainerTool) -> Result<()> {
        if tool == ContainerTool::Podman && self.platform != HostPlatform::MacOs {
            return Err(DocsError::Platform {
                tool: tool.to_string(),
                platform: self.platform.to_string(),
            });
        }
        Ok(())
    }

    /// [`resolve`](Self::resolve) then [`validate`](Self::validate).
    pub fn select(&self, requested: Option<&str>) -> Result<ContainerTool> {
        let tool = self.resolve(requested)?;
        self.validate(tool)?;
        Ok(tool)
    }
}
