//! Layered unit settings
//!
//! A unit's effective configuration is built from three layers, later
//! layers winning per key:
//!
//! 1. the unit's own defaults (registered with the unit),
//! 2. session-global options (`prefix`, `temp`, `force_install`, `dry`, ...),
//! 3. per-unit overrides from the command line (`--gcc:version=5.2.0`).
//!
//! Values are typed. Merging copies values as they are; a bool never becomes
//! the string `"true"` and a string is never parsed into a bool.

use crate::core::error::SettingsError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Keys every session provides to every recipe.
pub const PREFIX: &str = "prefix";
pub const TEMP: &str = "temp";
pub const FORCE_INSTALL: &str = "force_install";
pub const DRY: &str = "dry";
pub const VERSION: &str = "version";

/// A single setting value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bool(bool),
}

impl Value {
    /// Interpret a command-line option value.
    ///
    /// A bare flag (`--dry`) is `true`; `true`/`false` in any case become
    /// bools; anything else stays a string.
    pub fn from_cli(raw: Option<&str>) -> Value {
        match raw {
            None => Value::Bool(true),
            Some(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
            Some(s) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
            Some(s) => Value::Str(s.to_string()),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&Path> for Value {
    fn from(p: &Path) -> Self {
        Value::Str(p.to_string_lossy().into_owned())
    }
}

/// Normalize an option key: `force-install` -> `force_install`
pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// One layer of settings, or the merged result of several
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session-global baseline: install prefix, scratch directory and
    /// both flags off.
    pub fn baseline(prefix: &Path, temp: &Path) -> Self {
        Settings::new()
            .with(PREFIX, prefix)
            .with(TEMP, temp)
            .with(FORCE_INSTALL, false)
            .with(DRY, false)
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every key of `other` over this layer.
    pub fn overlay(&mut self, other: &Settings) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge layers in order; later layers override earlier ones per key.
    pub fn merge<'a, I>(layers: I) -> Settings
    where
        I: IntoIterator<Item = &'a Settings>,
    {
        let mut merged = Settings::new();
        for layer in layers {
            merged.overlay(layer);
        }
        merged
    }

    /// Required string setting
    pub fn str(&self, key: &str) -> Result<&str, SettingsError> {
        match self.values.get(key) {
            Some(Value::Str(s)) => Ok(s),
            Some(other) => Err(wrong_type(key, "string", other)),
            None => Err(SettingsError::Missing {
                key: key.to_string(),
            }),
        }
    }

    /// Optional string setting. An empty string counts as unset.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, SettingsError> {
        match self.values.get(key) {
            Some(Value::Str(s)) if s.is_empty() => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(other) => Err(wrong_type(key, "string", other)),
            None => Ok(None),
        }
    }

    /// Required bool setting
    pub fn bool(&self, key: &str) -> Result<bool, SettingsError> {
        match self.values.get(key) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(wrong_type(key, "bool", other)),
            None => Err(SettingsError::Missing {
                key: key.to_string(),
            }),
        }
    }

    /// Bool setting that defaults to `false` when absent
    pub fn flag(&self, key: &str) -> Result<bool, SettingsError> {
        match self.values.get(key) {
            None => Ok(false),
            Some(_) => self.bool(key),
        }
    }

    /// Required path setting
    pub fn path(&self, key: &str) -> Result<PathBuf, SettingsError> {
        self.str(key).map(PathBuf::from)
    }

    pub fn prefix(&self) -> Result<PathBuf, SettingsError> {
        self.path(PREFIX)
    }

    pub fn temp(&self) -> Result<PathBuf, SettingsError> {
        self.path(TEMP)
    }

    pub fn version(&self) -> Result<&str, SettingsError> {
        self.str(VERSION)
    }

    pub fn force_install(&self) -> Result<bool, SettingsError> {
        self.flag(FORCE_INSTALL)
    }

    pub fn dry(&self) -> Result<bool, SettingsError> {
        self.flag(DRY)
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &Value) -> SettingsError {
    debug_assert_ne!(expected, found.type_name());
    SettingsError::WrongType {
        key: key.to_string(),
        expected,
        found: found.clone(),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Settings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Settings {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
