//! Build a cross toolchain with crosstool-ng
//!
//! Options (per unit, e.g. `--ct-ng-build:target=arm-unknown-eabi`):
//! - `target` (required): toolchain triple; also names `<prefix>/cross/<target>`
//! - `config`: existing `.config` to seed the build with instead of menuconfig
//! - `reconfig`: throw away the previous configuration
//! - `no_menuconfig`: fail instead of opening the interactive configurator
//!
//! Not part of `all`; it only runs when requested by name.

use super::{BuildSteps, arg, remove_dir_if_exists};
use crate::core::error::RecipeError;
use crate::core::output;
use crate::engine::recipe::{Recipe, RecipeOutcome};
use crate::engine::registry::Registry;
use crate::engine::settings::Settings;
use crate::helpers::probe::VersionProbe;
use crate::helpers::process::{Cmd, RunOptions};
use crate::helpers::{Toolbox, bin_dir, cross_tool, ensure_dir, job_count};
use std::path::Path;

pub const NAME: &str = "ct-ng-build";

/// `version` is the gcc version the finished toolchain should report.
pub fn defaults() -> Settings {
    Settings::new()
        .with("version", "5.2.0")
        .with("reconfig", false)
        .with("no_menuconfig", false)
}

pub fn register(registry: &mut Registry) {
    registry.register(NAME, CtNgBuild, &["crosstool-ng"], false, defaults());
}

pub struct CtNgBuild;

impl CtNgBuild {
    /// Make sure `<dst_dir>/.config` exists, from `config` or menuconfig.
    fn configure(
        &self,
        settings: &Settings,
        tools: &Toolbox,
        ct_ng: &Path,
        dst_dir: &Path,
    ) -> Result<(), RecipeError> {
        let cfg_file = dst_dir.join(".config");
        if cfg_file.is_file() && !settings.flag("reconfig")? {
            output::detail(&format!("using existing {}", cfg_file.display()));
            return Ok(());
        }

        let seed = settings.opt_str("config")?;
        if seed.is_none() && settings.flag("no_menuconfig")? {
            return Err(RecipeError::Invalid(format!(
                "configuration file {} does not exist",
                cfg_file.display()
            )));
        }

        remove_dir_if_exists(dst_dir)?;
        ensure_dir(dst_dir)?;

        match seed {
            Some(seed) => {
                std::fs::copy(seed, &cfg_file).map_err(RecipeError::io(format!(
                    "cannot copy {} to {}",
                    seed,
                    cfg_file.display()
                )))?;
            }
            None => {
                output::sub_action("ct-ng menuconfig");
                tools.runner().run(
                    &Cmd::argv([arg(ct_ng), "menuconfig".to_string()]),
                    &RunOptions::default().dir(dst_dir),
                )?;
                if !cfg_file.is_file() {
                    return Err(RecipeError::Invalid(
                        "ct-ng menuconfig did not save a .config file".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Recipe for CtNgBuild {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        let Some(target) = settings.opt_str("target")? else {
            return Ok(RecipeOutcome::Exited(format!(
                "no target given, pass --{}:target=<triple>",
                NAME
            )));
        };

        let prefix = settings.prefix()?;
        let version = settings.version()?;
        let dst_dir = prefix.join("cross").join(target);
        let ct_ng = bin_dir(&prefix).join("ct-ng");

        if !settings.flag("reconfig")? {
            let gcc = bin_dir(&dst_dir).join(cross_tool(Some(target), "gcc"));
            let probe = VersionProbe::new(
                format!("{} toolchain", target),
                Cmd::argv([arg(&gcc), "--version".to_string()]),
            );
            if !probe
                .check(tools.runner(), version, settings.force_install()?)
                .needs_install()
            {
                return Ok(RecipeOutcome::UpToDate);
            }
        }

        self.configure(settings, tools, &ct_ng, &dst_dir)?;

        output::action(&format!(
            "building {} with crosstool-ng in {}",
            target,
            dst_dir.display()
        ));
        BuildSteps::new(tools, &dst_dir).run([
            arg(&ct_ng),
            format!("build.{}", job_count(settings)?),
        ])?;

        Ok(RecipeOutcome::Installed)
    }
}
