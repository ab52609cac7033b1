//! Installer registry
//!
//! Maps unit names to their recipe, declared dependencies and default
//! settings. The registry is an ordinary value: the caller builds it and lends
//! it to an [`InstallSession`](super::InstallSession).
//!
//! Registering a name that already exists replaces the earlier unit; the last
//! registration wins. The replaced unit is handed back so callers that care
//! can notice.

use super::recipe::Recipe;
use super::settings::Settings;
use crate::core::error::InstallError;
use std::collections::BTreeMap;
use std::fmt;

/// A named installable unit
pub struct Unit {
    name: String,
    recipe: Box<dyn Recipe>,
    dependencies: Vec<String>,
    default_settings: Settings,
    default_install: bool,
}

impl Unit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recipe(&self) -> &dyn Recipe {
        self.recipe.as_ref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn default_settings(&self) -> &Settings {
        &self.default_settings
    }

    pub fn default_install(&self) -> bool {
        self.default_install
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("default_settings", &self.default_settings)
            .field("default_install", &self.default_install)
            .finish_non_exhaustive()
    }
}

/// Table of every unit the installer knows about
#[derive(Debug, Default)]
pub struct Registry {
    units: BTreeMap<String, Unit>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under `name`.
    ///
    /// Returns the unit previously registered under the same name, which this
    /// call replaces.
    pub fn register<R>(
        &mut self,
        name: &str,
        recipe: R,
        dependencies: &[&str],
        default_install: bool,
        default_settings: Settings,
    ) -> Option<Unit>
    where
        R: Recipe + 'static,
    {
        let unit = Unit {
            name: name.to_string(),
            recipe: Box::new(recipe),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            default_settings,
            default_install,
        };
        self.units.insert(name.to_string(), unit)
    }

    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    /// Look up a unit, failing with `UnitNotFound`
    pub fn lookup(&self, name: &str) -> Result<&Unit, InstallError> {
        self.get(name).ok_or_else(|| InstallError::UnitNotFound {
            name: name.to_string(),
            requested_by: None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// All registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Names of the units installed by `all`, sorted
    pub fn all_default_units(&self) -> Vec<&str> {
        self.units
            .values()
            .filter(|u| u.default_install)
            .map(|u| u.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
