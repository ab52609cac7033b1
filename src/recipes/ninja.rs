//! Ninja, bootstrapped from a release tag

use super::{BuildSteps, announce, arg, remove_dir_if_exists};
use crate::core::error::RecipeError;
use crate::engine::recipe::{Recipe, RecipeOutcome};
use crate::engine::registry::Registry;
use crate::engine::settings::Settings;
use crate::helpers::acquire::GitSource;
use crate::helpers::probe::{VersionMatch, VersionProbe};
use crate::helpers::process::Cmd;
use crate::helpers::{Toolbox, bin_dir, ensure_dir};

pub const NAME: &str = "ninja";
const GIT_URL: &str = "https://github.com/ninja-build/ninja.git";

pub fn defaults() -> Settings {
    Settings::new().with("version", "1.7.1")
}

pub fn register(registry: &mut Registry) {
    registry.register(NAME, Ninja, &[], true, defaults());
}

pub struct Ninja;

impl Recipe for Ninja {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        let dst_dir = bin_dir(&settings.prefix()?);
        let dst_bin = dst_dir.join(NAME);
        let version = settings.version()?;

        // `ninja --version` prints the bare version, so anchor the match
        let probe = VersionProbe::new(NAME, Cmd::argv([arg(&dst_bin), "--version".to_string()]))
            .matching(VersionMatch::Prefix);
        if !probe
            .check(tools.runner(), version, settings.force_install()?)
            .needs_install()
        {
            return Ok(RecipeOutcome::UpToDate);
        }

        announce(NAME, version);
        let code_dir = settings.temp()?.join(NAME);
        remove_dir_if_exists(&code_dir)?;
        tools
            .acquirer()
            .clone_repository(&GitSource::new(GIT_URL, &code_dir, format!("v{}", version)))?;

        BuildSteps::new(tools, &code_dir).run(["./configure.py", "--bootstrap"])?;

        ensure_dir(&dst_dir)?;
        let built = code_dir.join(NAME);
        if dst_bin.exists() {
            std::fs::remove_file(&dst_bin)
                .map_err(RecipeError::io(format!("cannot remove {}", dst_bin.display())))?;
        }
        std::fs::copy(&built, &dst_bin).map_err(RecipeError::io(format!(
            "cannot copy {} to {}",
            built.display(),
            dst_bin.display()
        )))?;

        Ok(RecipeOutcome::Installed)
    }
}
