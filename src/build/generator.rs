use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{DocsError, Result};

/// Overrides the generator program.
pub const GENERATOR_ENV: &str = "DOC_BUILDER_GENERATOR";

/// Generator looked up on `PATH` when [`GENERATOR_ENV`] is unset.
pub const DEFAULT_GENERATOR: &str = "build_docs";

/// The external documentation generator.
pub trait Generator {
    /// Run one build with a flat argument list. Blocks until it finishes.
    fn generate(&self, args: &[String]) -> Result<()>;

    /// Program name for progress output.
    fn program(&self) -> String;
}

/// Runs the generator as a child process with inherited stdio.
#[derive(Debug, Clone)]
pub struct ExternalGenerator {
    program: PathBuf,
    working_dir: PathBuf,
}

impl ExternalGenerator {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Resolve the generator from [`GENERATOR_ENV`], then `PATH`.
    pub fn locate(working_dir: &Path) -> Result<Self> {
        if let Some(program) = env::var_os(GENERATOR_ENV) {
            let program = PathBuf::from(program);
            if !program.is_file() {
                return Err(DocsError::Configuration(format!(
                    "{GENERATOR_ENV} points to '{}', which is not a file",
                    program.display()
                )));
            }
            return Ok(Self::new(program, working_dir));
        }

        let program = which::which(DEFAULT_GENERATOR).map_err(|_| {
            DocsError::Configuration(format!(
                "could not find documentation generator '{DEFAULT_GENERATOR}' on PATH; \
                 set {GENERATOR_ENV}=/path/to/{DEFAULT_GENERATOR}"
            ))
        })?;
        Ok(Self::new(program, working_dir))
    }
}

impl Generator for ExternalGenerator {
    fn generate(&self, args: &[String]) -> Result<()> {
        debug!(
            program = %self.program.display(),
            dir = %self.working_dir.display(),
            "spawning generator"
        );
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.working_dir)
            .status()
            .map_err(|e| {
                DocsError::io(format!("running generator '{}'", self.program.display()), e)
            })?;

        if !status.success() {
            return Err(DocsError::Generator {
                program: self.program(),
                status,
            });
        }
        Ok(())
    }

    fn program(&self) -> String {
        self.program.display().to_string()
    }
}
