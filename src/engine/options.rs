//! Command-line option handling
//!
//! Per-unit overrides (`--gcc:version=5.2.0`) cannot be declared to clap
//! ahead of time, so they are split out of the raw arguments first and
//! everything else goes through the normal parser.

use super::registry::Registry;
use super::settings::{Settings, Value, normalize_key};
use crate::core::error::UsageError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One `--<unit>:<key>[=<value>]` option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOverride {
    pub unit: String,
    pub key: String,
    pub value: Value,
}

/// Parse `token` as a per-unit override.
///
/// Returns `Ok(None)` for tokens that are not of the `--unit:key` form. The
/// key is normalized (`-` becomes `_`); the unit name is kept as written
/// because unit names contain dashes.
pub fn parse_unit_override(token: &str, registry: &Registry) -> Result<Option<UnitOverride>, UsageError> {
    let Some(body) = token.strip_prefix("--") else {
        return Ok(None);
    };
    let (key, raw_value) = match body.split_once('=') {
        Some((k, v)) => (k, Some(v)),
        None => (body, None),
    };
    let Some((unit, sub_key)) = key.split_once(':') else {
        return Ok(None);
    };
    if unit.is_empty() || sub_key.is_empty() {
        return Err(UsageError::InvalidOption(token.to_string()));
    }
    if !registry.contains(unit) {
        return Err(UsageError::UnknownUnit {
            unit: unit.to_string(),
            option: token.to_string(),
        });
    }
    Ok(Some(UnitOverride {
        unit: unit.to_string(),
        key: normalize_key(sub_key),
        value: Value::from_cli(raw_value),
    }))
}

/// Separate per-unit overrides from the arguments meant for clap.
///
/// The first argument (the program name) is always kept. Everything after
/// a bare `--` is passed through untouched.
pub fn split_unit_overrides<I>(
    args: I,
    registry: &Registry,
) -> Result<(Vec<String>, HashMap<String, Settings>), UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut rest = Vec::new();
    let mut overrides: HashMap<String, Settings> = HashMap::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            rest.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            rest.push(arg);
            continue;
        }
        match parse_unit_override(&arg, registry)? {
            Some(o) => overrides.entry(o.unit).or_default().set(&o.key, o.value),
            None => rest.push(arg),
        }
    }

    Ok((rest, overrides))
}

/// Parse a `--set` assignment: `KEY=VALUE`, or a bare `KEY` meaning true
pub fn parse_assignment(raw: &str) -> Result<(String, Value), UsageError> {
    let (key, value) = match raw.split_once('=') {
        Some((k, v)) => (k, Some(v)),
        None => (raw, None),
    };
    let key = key.trim_start_matches("--");
    if key.is_empty() || key.contains(':') {
        return Err(UsageError::InvalidAssignment(raw.to_string()));
    }
    Ok((normalize_key(key), Value::from_cli(value)))
}

/// Expand `~` and make `raw` absolute against the current directory.
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(raw),
        },
        _ => PathBuf::from(raw),
    };
    absolute(&expanded)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve requested names into the unit list to install.
///
/// `all` expands to every default-install unit (sorted). Duplicates are
/// dropped, keeping the first occurrence. Unknown names are rejected here
/// so nothing runs on a typo.
pub fn expand_targets<S: AsRef<str>>(registry: &Registry, requested: &[S]) -> Result<Vec<String>, UsageError> {
    if requested.is_empty() {
        return Err(UsageError::NothingRequested);
    }

    let mut targets: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !targets.iter().any(|t| t == name) {
            targets.push(name.to_string());
        }
    };

    for name in requested {
        let name = name.as_ref();
        if name == "all" {
            registry.all_default_units().into_iter().for_each(&mut push);
        } else if registry.contains(name) {
            push(name);
        } else {
            return Err(UsageError::UnknownTarget(name.to_string()));
        }
    }

    Ok(targets)
}
