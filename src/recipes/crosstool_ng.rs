//! crosstool-ng, the toolchain generator used by `ct-ng-build`

use super::{BuildSteps, announce, arg, remove_dir_if_exists};
use crate::core::error::RecipeError;
use crate::engine::recipe::{Recipe, RecipeOutcome};
use crate::engine::registry::Registry;
use crate::engine::settings::Settings;
use crate::helpers::acquire::GitSource;
use crate::helpers::probe::VersionProbe;
use crate::helpers::process::Cmd;
use crate::helpers::{Toolbox, bin_dir};

pub const NAME: &str = "crosstool-ng";
const GIT_URL: &str = "https://github.com/crosstool-ng/crosstool-ng.git";

pub fn defaults() -> Settings {
    Settings::new().with("version", "1.22.0")
}

pub fn register(registry: &mut Registry) {
    registry.register(NAME, CrosstoolNg, &[], true, defaults());
}

pub struct CrosstoolNg;

impl Recipe for CrosstoolNg {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        let prefix = settings.prefix()?;
        let version = settings.version()?;

        let ct_ng = bin_dir(&prefix).join("ct-ng");
        let probe = VersionProbe::new(NAME, Cmd::argv([arg(&ct_ng), "version".to_string()]));
        if !probe
            .check(tools.runner(), version, settings.force_install()?)
            .needs_install()
        {
            return Ok(RecipeOutcome::UpToDate);
        }

        announce(NAME, version);
        let code_dir = settings.temp()?.join(NAME);
        remove_dir_if_exists(&code_dir)?;
        tools.acquirer().clone_repository(&GitSource::new(
            GIT_URL,
            &code_dir,
            format!("crosstool-ng-{}", version),
        ))?;

        let steps = BuildSteps::new(tools, &code_dir);
        steps.run(["./bootstrap"])?;
        steps.run(["./configure".to_string(), format!("--prefix={}", prefix.display())])?;
        steps.run(["make"])?;
        steps.run(["make", "install"])?;

        Ok(RecipeOutcome::Installed)
    }
}
