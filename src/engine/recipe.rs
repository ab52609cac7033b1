//! The recipe capability
//!
//! A recipe is the tool-specific build logic for one unit. It receives the
//! unit's merged settings and the session's toolbox, and nothing else.

use crate::core::error::RecipeError;
use crate::engine::settings::Settings;
use crate::helpers::Toolbox;

/// How a recipe finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeOutcome {
    /// Work was done and the tool is now installed
    Installed,
    /// The idempotency probe found the requested version; nothing was done
    UpToDate,
    /// The recipe stopped on purpose (e.g. a required option was not given).
    /// Counts as success for the session.
    Exited(String),
}

/// Build logic for one unit
pub trait Recipe {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError>;
}

impl<F> Recipe for F
where
    F: Fn(&Settings, &Toolbox) -> Result<RecipeOutcome, RecipeError>,
{
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        self(settings, tools)
    }
}
