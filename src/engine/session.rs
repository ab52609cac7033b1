//! Install session: the orchestration core
//!
//! One session is one provisioning run. `install(name)` runs the unit's
//! dependencies first, then its recipe, at most once per unit:
//!
//! 1. already installed in this session -> done
//! 2. look the unit up (missing -> `UnitNotFound`, naming the requester)
//! 3. merge settings: unit defaults < global options < per-unit options
//! 4. mark the unit installed
//! 5. install dependencies in declared order, stopping at the first failure
//! 6. dry run -> print a notice, nothing else
//! 7. run the recipe; any failure becomes `InstallFailed` and ends the session
//! 8. restore the working directory the session started in
//!
//! Step 4 happens before step 5 on purpose: a dependency cycle is cut at its
//! second visit and never recurses forever. Use
//! [`find_cycle`](super::plan::find_cycle) first if a cycle should be an error.

use super::recipe::RecipeOutcome;
use super::registry::{Registry, Unit};
use super::settings::Settings;
use crate::core::error::{InstallError, RecipeError};
use crate::core::output;
use crate::helpers::Toolbox;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Lines of captured output shown when a command fails
const FAILURE_OUTPUT_TAIL: usize = 40;

/// State for one provisioning run
pub struct InstallSession<'r> {
    registry: &'r Registry,
    global: Settings,
    unit_options: HashMap<String, Settings>,
    installed: HashSet<String>,
    executed: Vec<String>,
    tools: Toolbox,
    origin: Option<PathBuf>,
}

impl<'r> InstallSession<'r> {
    /// Start a session using the real process runner and source acquirer.
    ///
    /// The current working directory is captured here and restored after
    /// every recipe.
    pub fn new(registry: &'r Registry, global: Settings) -> Self {
        let origin = match std::env::current_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                output::warning(&format!(
                    "cannot determine working directory, it will not be restored: {}",
                    e
                ));
                None
            }
        };
        Self {
            registry,
            global,
            unit_options: HashMap::new(),
            installed: HashSet::new(),
            executed: Vec::new(),
            tools: Toolbox::system(),
            origin,
        }
    }

    /// Replace the toolbox handed to recipes
    pub fn with_toolbox(mut self, tools: Toolbox) -> Self {
        self.tools = tools;
        self
    }

    /// Set the per-unit override layer for `unit`
    pub fn with_unit_options(mut self, unit: &str, options: Settings) -> Self {
        self.set_unit_options(unit, options);
        self
    }

    pub fn set_unit_options(&mut self, unit: &str, options: Settings) {
        self.unit_options.insert(unit.to_string(), options);
    }

    /// Merged settings for `unit` as its recipe would see them
    pub fn settings_for(&self, unit: &Unit) -> Settings {
        let empty = Settings::new();
        let overrides = self.unit_options.get(unit.name()).unwrap_or(&empty);
        Settings::merge([unit.default_settings(), &self.global, overrides])
    }

    /// Whether every unit in `names` would only be reported, not run.
    ///
    /// A unit that is unknown or has an unreadable `dry` setting counts as
    /// a real run.
    pub fn is_dry_run<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().all(|name| {
            self.registry
                .get(name.as_ref())
                .is_some_and(|unit| self.settings_for(unit).dry().unwrap_or(false))
        })
    }

    /// Whether `name` has been handled in this session
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains(name)
    }

    /// Names handled so far (dependencies included)
    pub fn installed(&self) -> impl Iterator<Item = &str> {
        self.installed.iter().map(String::as_str)
    }

    /// Units in the order their recipe step was reached (run or dry notice)
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Install each requested unit in the order given.
    ///
    /// Stops at the first failure; later units are not attempted.
    pub fn install_all<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), InstallError> {
        for name in names {
            self.install(name.as_ref())?;
        }
        Ok(())
    }

    /// Install `name` and its dependencies.
    pub fn install(&mut self, name: &str) -> Result<(), InstallError> {
        self.install_unit(name, None)
    }

    fn install_unit(&mut self, name: &str, requested_by: Option<&str>) -> Result<(), InstallError> {
        if self.installed.contains(name) {
            return Ok(());
        }

        let registry = self.registry;
        let unit = registry
            .get(name)
            .ok_or_else(|| InstallError::UnitNotFound {
                name: name.to_string(),
                requested_by: requested_by.map(str::to_string),
            })?;

        let settings = self.settings_for(unit);

        self.installed.insert(name.to_string());

        for dep in unit.dependencies() {
            self.install_unit(dep, Some(name))?;
        }

        let dry = settings.dry().map_err(|e| self.failed(name, e.into()))?;
        self.executed.push(name.to_string());
        if dry {
            output::note(&format!("dry installation of {}", name));
            return Ok(());
        }

        let result = {
            let _workdir = WorkdirGuard::new(self.origin.clone());
            unit.recipe().run(&settings, &self.tools)
        };

        match result {
            Ok(RecipeOutcome::Installed) => {
                output::success(&format!("{} installed", name));
                Ok(())
            }
            Ok(RecipeOutcome::UpToDate) => Ok(()),
            Ok(RecipeOutcome::Exited(reason)) => {
                output::warning(&format!("{} stopped early: {}", name, reason));
                Ok(())
            }
            Err(cause) => Err(self.failed(name, cause)),
        }
    }

    /// Log a recipe failure with its context and wrap it as `InstallFailed`
    fn failed(&self, name: &str, cause: RecipeError) -> InstallError {
        output::error(&format!("installing {} failed: {}", name, cause));
        if let Some(captured) = cause.captured_output() {
            let lines: Vec<&str> = captured.lines().collect();
            let tail = &lines[lines.len().saturating_sub(FAILURE_OUTPUT_TAIL)..];
            output::error_output(&tail.join("\n"));
        }
        InstallError::InstallFailed {
            name: name.to_string(),
            cause,
        }
    }
}

/// Restores the session's starting directory when dropped
struct WorkdirGuard {
    origin: Option<PathBuf>,
}

impl WorkdirGuard {
    fn new(origin: Option<PathBuf>) -> Self {
        Self { origin }
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        let Some(origin) = &self.origin else {
            return;
        };
        let unchanged = std::env::current_dir().is_ok_and(|cwd| &cwd == origin);
        if !unchanged && let Err(e) = std::env::set_current_dir(origin) {
            output::warning(&format!(
                "cannot restore working directory {}: {}",
                origin.display(),
                e
            ));
        }
    }
}
