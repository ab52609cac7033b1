//! Helpers shared by recipes
//!
//! ## Categories
//!
//! - **process**: `Cmd`, `RunOptions`, the `ProcessRunner` seam
//! - **acquire**: git clones and archive downloads behind `SourceAcquirer`
//! - **probe**: the "is this version already installed?" check
//!
//! Recipes reach the runner and acquirer only through the [`Toolbox`] the
//! session hands them, so a test can swap both for fakes.

pub mod acquire;
pub mod probe;
pub mod process;

use crate::core::error::RecipeError;
use crate::engine::settings::Settings;
use acquire::{SourceAcquirer, SystemAcquirer};
use process::{ProcessRunner, SystemRunner};
use std::path::{Path, PathBuf};

/// Process runner and source acquirer lent to every recipe
pub struct Toolbox {
    runner: Box<dyn ProcessRunner>,
    acquirer: Box<dyn SourceAcquirer>,
}

impl Toolbox {
    pub fn new(
        runner: impl ProcessRunner + 'static,
        acquirer: impl SourceAcquirer + 'static,
    ) -> Self {
        Self {
            runner: Box::new(runner),
            acquirer: Box::new(acquirer),
        }
    }

    /// Host processes, real git and HTTP
    pub fn system() -> Self {
        Self::new(SystemRunner, SystemAcquirer::new())
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    pub fn acquirer(&self) -> &dyn SourceAcquirer {
        self.acquirer.as_ref()
    }
}

/// Parallel build jobs: the `jobs` setting, else the host CPU count
pub fn job_count(settings: &Settings) -> Result<usize, RecipeError> {
    match settings.opt_str("jobs")? {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| RecipeError::Invalid(format!("jobs must be a positive number, got {:?}", raw))),
        None => Ok(num_cpus::get()),
    }
}

/// Tool name with an optional cross prefix: `arm-eabi-gcc` or `gcc`
pub fn cross_tool(target: Option<&str>, tool: &str) -> String {
    match target {
        Some(t) => format!("{}-{}", t, tool),
        None => tool.to_string(),
    }
}

/// `<prefix>/bin`
pub fn bin_dir(prefix: &Path) -> PathBuf {
    prefix.join("bin")
}

/// Create `dir` and its parents
pub fn ensure_dir(dir: &Path) -> Result<(), RecipeError> {
    std::fs::create_dir_all(dir).map_err(RecipeError::io(format!("cannot create {}", dir.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_count() {
        assert_eq!(job_count(&Settings::new().with("jobs", "3")).unwrap(), 3);
        assert_eq!(job_count(&Settings::new()).unwrap(), num_cpus::get());
        assert!(job_count(&Settings::new().with("jobs", "0")).is_err());
        assert!(job_count(&Settings::new().with("jobs", "many")).is_err());
    }

    #[test]
    fn test_cross_tool() {
        assert_eq!(cross_tool(Some("arm-eabi"), "ld"), "arm-eabi-ld");
        assert_eq!(cross_tool(None, "gcc"), "gcc");
    }
}
