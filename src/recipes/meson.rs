//! Meson, installed with pip3 into the prefix
//!
//! Old meson releases ship `meson.py`-style entry points; those get
//! extension-less symlinks so `meson` is on the path as usual. Because pip
//! installs into `<prefix>/lib/pythonX.Y/site-packages`, the user also needs a
//! PYTHONPATH entry, which is printed at the end.

use super::{announce, arg};
use crate::core::error::RecipeError;
use crate::core::output;
use crate::engine::recipe::{Recipe, RecipeOutcome};
use crate::engine::registry::Registry;
use crate::engine::settings::Settings;
use crate::helpers::probe::VersionProbe;
use crate::helpers::process::{Cmd, RunOptions};
use crate::helpers::{Toolbox, bin_dir, ensure_dir};
use std::path::{Path, PathBuf};

pub const NAME: &str = "meson";
const LEGACY_SCRIPTS: [&str; 4] = ["meson", "mesonconf", "mesonintrospect", "wraptool"];

pub fn defaults() -> Settings {
    Settings::new().with("version", "0.32.0")
}

pub fn register(registry: &mut Registry) {
    registry.register(NAME, Meson, &["ninja"], true, defaults());
}

pub fn pip_command(prefix: &Path, version: &str) -> Cmd {
    Cmd::argv([
        "pip3".to_string(),
        "install".to_string(),
        "--prefix".to_string(),
        arg(prefix),
        "--upgrade".to_string(),
        format!("meson=={}", version),
    ])
}

/// Point `<bin>/<name>` at `<bin>/<name>.py` for every legacy script present
pub fn link_legacy_scripts(bin: &Path) -> Result<usize, RecipeError> {
    let mut linked = 0;
    for name in LEGACY_SCRIPTS {
        let script = bin.join(format!("{}.py", name));
        if !script.is_file() {
            continue;
        }
        let link = bin.join(name);
        if link.symlink_metadata().is_ok() {
            std::fs::remove_file(&link)
                .map_err(RecipeError::io(format!("cannot remove {}", link.display())))?;
        }
        std::os::unix::fs::symlink(&script, &link)
            .map_err(RecipeError::io(format!("cannot link {}", link.display())))?;
        linked += 1;
    }
    Ok(linked)
}

/// The `site-packages` directory pip installed into, if it is unambiguous
pub fn site_packages(prefix: &Path) -> Result<Option<PathBuf>, RecipeError> {
    let pattern = prefix.join("lib").join("python*");
    let pattern = pattern.to_string_lossy();
    let candidates: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| RecipeError::Invalid(format!("bad glob pattern {}: {}", pattern, e)))?
        .filter_map(Result::ok)
        .collect();

    match candidates.as_slice() {
        [only] => {
            let site = only.join("site-packages");
            Ok(site.is_dir().then_some(site))
        }
        [] => Ok(None),
        many => {
            output::warning(&format!(
                "more than one python directory under {}: {}",
                prefix.display(),
                many.iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            Ok(None)
        }
    }
}

pub struct Meson;

impl Recipe for Meson {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        let prefix = settings.prefix()?;
        let bin = bin_dir(&prefix);
        let version = settings.version()?;

        let probe = VersionProbe::new(NAME, Cmd::argv([arg(&bin.join(NAME)), "--version".to_string()]));
        if !probe
            .check(tools.runner(), version, settings.force_install()?)
            .needs_install()
        {
            return Ok(RecipeOutcome::UpToDate);
        }

        announce(NAME, version);
        ensure_dir(&bin)?;
        tools
            .runner()
            .run(&pip_command(&prefix, version), &RunOptions::default().echo())?;

        link_legacy_scripts(&bin)?;

        match site_packages(&prefix)? {
            Some(site) => {
                output::info("add the install prefix to PYTHONPATH, e.g. in .bashrc:");
                output::detail(&format!("export PYTHONPATH={}:$PYTHONPATH", site.display()));
            }
            None => output::warning(&format!(
                "meson needs PYTHONPATH but no site-packages directory was found under {}",
                prefix.join("lib").display()
            )),
        }

        Ok(RecipeOutcome::Installed)
    }
}
