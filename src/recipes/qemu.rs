//! QEMU with the ARM system and user-mode targets

use super::{BuildSteps, announce, arg, remove_dir_if_exists};
use crate::core::error::RecipeError;
use crate::engine::recipe::{Recipe, RecipeOutcome};
use crate::engine::registry::Registry;
use crate::engine::settings::Settings;
use crate::helpers::acquire::GitSource;
use crate::helpers::probe::VersionProbe;
use crate::helpers::process::Cmd;
use crate::helpers::{Toolbox, bin_dir, ensure_dir, job_count};

pub const NAME: &str = "qemu";
const PROBE_BIN: &str = "qemu-system-arm";
const GIT_URL: &str = "https://gitlab.com/qemu-project/qemu.git";

/// `version` is what the probe expects, `co_version` the tag checked out.
pub fn defaults() -> Settings {
    Settings::new()
        .with("version", "2.4.0.1")
        .with("co_version", "2.4.0.1")
        .with("target_list", "arm-softmmu,arm-linux-user")
}

pub fn register(registry: &mut Registry) {
    registry.register(NAME, Qemu, &[], true, defaults());
}

pub struct Qemu;

impl Recipe for Qemu {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        let prefix = settings.prefix()?;
        let version = settings.version()?;

        let dst_bin = bin_dir(&prefix).join(PROBE_BIN);
        let probe = VersionProbe::new(PROBE_BIN, Cmd::argv([arg(&dst_bin), "--version".to_string()]));
        if !probe
            .check(tools.runner(), version, settings.force_install()?)
            .needs_install()
        {
            return Ok(RecipeOutcome::UpToDate);
        }

        announce(PROBE_BIN, version);
        let code_dir = settings.temp()?.join(PROBE_BIN);
        remove_dir_if_exists(&code_dir)?;
        let source = GitSource::new(GIT_URL, &code_dir, format!("v{}", settings.str("co_version")?))
            .recursive(false);
        tools.acquirer().clone_repository(&source)?;

        BuildSteps::new(tools, &code_dir).run(["git", "submodule", "update", "--init", "dtc"])?;

        let build_dir = code_dir.join("build");
        ensure_dir(&build_dir)?;
        let steps = BuildSteps::new(tools, &build_dir);

        let mut configure = vec![
            "../configure".to_string(),
            format!("--prefix={}", prefix.display()),
            format!("--target-list={}", settings.str("target_list")?),
        ];
        if let Some(python) = settings.opt_str("python")? {
            configure.push(format!("--python={}", python));
        }
        steps.run(configure)?;
        let jobs = job_count(settings)?.to_string();
        steps.run(["make", "-j", jobs.as_str()])?;
        steps.run(["make", "install"])?;

        Ok(RecipeOutcome::Installed)
    }
}
