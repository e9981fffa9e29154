//! Preflight checks before touching the working copy.
//!
//! Validates that the host has the tools the build loop shells out to, so a
//! missing binary is reported up front instead of halfway through a checkout.
//!
//! # Example
//!
//! ```rust
//! use doc_builder::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("git") {
//!     println!("git not installed");
//! }
//!
//! let tools = &[("git", "git")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use crate::error::{DocsError, Result};

/// Check if a command exists on `PATH`.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Host tools needed by every run.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("git", "git")];

/// Check that specific tools are available.
///
/// Returns a configuration error listing every missing tool and the package
/// that provides it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .map(|(tool, package)| format!("  {} (install: {})", tool, package))
        .collect();

    if !missing.is_empty() {
        return Err(DocsError::Configuration(format!(
            "missing required host tools:\n{}",
            missing.join("\n")
        )));
    }

    Ok(())
}

/// Check all tools in [`REQUIRED_TOOLS`].
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}
