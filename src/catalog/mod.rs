//! Version catalog: which revisions get built, in what order.
//!
//! The catalog is read from a TOML file that lives in the documentation source
//! tree itself, which is why it is also one of the permanent files.
//!
//! ```toml
//! canonical_ref = "main"
//! tooling_submodule = "doc-builder"
//!
//! [[version]]
//! ref = "release-1.0"
//! short_name = "v1"
//! display_name = "v1.0"
//!
//! [[version]]
//! ref = "main"
//! short_name = "latest"
//! display_name = "Latest"
//! landing_version = true
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DocsError, Result};

/// Default catalog filename, relative to the documentation source directory.
pub const DEFAULT_VERSION_LIST: &str = "version_list.toml";

/// One documentation version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    reference: String,
    short_name: String,
    display_name: String,
    landing_version: bool,
}

impl Version {
    pub fn new(
        reference: impl Into<String>,
        short_name: impl Into<String>,
        display_name: impl Into<String>,
        landing_version: bool,
    ) -> Self {
        Self {
            reference: reference.into(),
            short_name: short_name.into(),
            display_name: display_name.into(),
            landing_version,
        }
    }

    /// Branch, tag, or commit to check out.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Name used in output paths and URLs.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Name shown in the version dropdown.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_landing_version(&self) -> bool {
        self.landing_version
    }

    /// Subdirectory of the publication root that receives this version.
    ///
    /// Empty for the landing version, which is published at the root.
    pub fn subdir(&self) -> &str {
        if self.landing_version {
            ""
        } else {
            &self.short_name
        }
    }
}

/// Ordered set of versions plus the reference permanent files come from.
#[derive(Debug, Clone)]
pub struct VersionCatalog {
    canonical_ref: String,
    tooling_submodule: Option<PathBuf>,
    versions: Vec<Version>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionListToml {
    canonical_ref: String,
    tooling_submodule: Option<String>,
    #[serde(default, rename = "version")]
    versions: Vec<VersionToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionToml {
    #[serde(rename = "ref")]
    reference: String,
    short_name: String,
    display_name: Option<String>,
    #[serde(default)]
    landing_version: bool,
}

impl VersionCatalog {
    pub fn new(canonical_ref: impl Into<String>, versions: Vec<Version>) -> Self {
        Self {
            canonical_ref: canonical_ref.into(),
            tooling_submodule: None,
            versions,
        }
    }

    pub fn with_tooling_submodule(mut self, path: impl Into<PathBuf>) -> Self {
        self.tooling_submodule = Some(path.into());
        self
    }

    /// Read, parse and validate a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            DocsError::Configuration(format!(
                "reading version list '{}': {}",
                path.display(),
                e
            ))
        })?;
        let catalog = Self::parse(&text).map_err(|e| match e {
            DocsError::Configuration(msg) => {
                DocsError::Configuration(format!("version list '{}': {}", path.display(), msg))
            }
            other => other,
        })?;
        Ok(catalog)
    }

    /// Parse and validate catalog TOML.
    pub fn parse(text: &str) -> Result<Self> {
        let parsed: VersionListToml =
            toml::from_str(text).map_err(|e| DocsError::Configuration(e.to_string()))?;

        let versions = parsed
            .versions
            .into_iter()
            .map(|v| {
                let display_name = v.display_name.unwrap_or_else(|| v.short_name.clone());
                Version::new(v.reference, v.short_name, display_name, v.landing_version)
            })
            .collect();

        let catalog = Self {
            canonical_ref: parsed.canonical_ref,
            tooling_submodule: parsed
                .tooling_submodule
                .map(|s| PathBuf::from(s.trim()))
                .filter(|p| !p.as_os_str().is_empty()),
            versions,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check catalog invariants. At most one landing version is allowed.
    pub fn validate(&self) -> Result<()> {
        let landing: Vec<&str> = self
            .versions
            .iter()
            .filter(|v| v.landing_version)
            .map(|v| v.short_name.as_str())
            .collect();
        if landing.len() > 1 {
            return Err(DocsError::Configuration(format!(
                "at most one landing version is allowed; found {}: {}",
                landing.len(),
                landing.join(", ")
            )));
        }

        if self.canonical_ref.trim().is_empty() {
            return Err(DocsError::Configuration(
                "canonical_ref must not be empty".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for version in &self.versions {
            validate_short_name(&version.short_name)?;
            if version.reference.trim().is_empty() {
                return Err(DocsError::Configuration(format!(
                    "version '{}' has an empty ref",
                    version.short_name
                )));
            }
            if !seen.insert(version.short_name.as_str()) {
                return Err(DocsError::Configuration(format!(
                    "duplicate short_name '{}'",
                    version.short_name
                )));
            }
        }

        Ok(())
    }

    /// Reference that permanent files are re-materialized from.
    pub fn canonical_ref(&self) -> &str {
        &self.canonical_ref
    }

    /// Submodule holding the build tooling, relative to the source directory.
    pub fn tooling_submodule(&self) -> Option<&Path> {
        self.tooling_submodule.as_deref()
    }

    pub fn landing_version(&self) -> Option<&Version> {
        self.versions.iter().find(|v| v.landing_version)
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Consume the catalog, yielding versions in build order.
    pub fn iterate(self) -> impl Iterator<Item = Version> {
        self.versions.into_iter()
    }
}

fn validate_short_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DocsError::Configuration(
            "short_name must not be empty".to_string(),
        ));
    }
    if name == "." || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(DocsError::Configuration(format!(
            "short_name must be a safe directory name: '{name}'"
        )));
    }
    Ok(())
}
