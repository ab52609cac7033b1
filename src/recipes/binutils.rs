//! GNU binutils from the sourceware git mirror

use super::{BuildSteps, announce, arg, remove_dir_if_exists};
use crate::core::error::RecipeError;
use crate::engine::recipe::{Recipe, RecipeOutcome};
use crate::engine::registry::Registry;
use crate::engine::settings::Settings;
use crate::helpers::acquire::GitSource;
use crate::helpers::probe::VersionProbe;
use crate::helpers::process::Cmd;
use crate::helpers::{Toolbox, bin_dir, cross_tool, ensure_dir, job_count};

pub const NAME: &str = "binutils";
const GIT_URL: &str = "git://sourceware.org/git/binutils-gdb.git";

pub fn defaults() -> Settings {
    Settings::new().with("version", "2.25.1")
}

pub fn register(registry: &mut Registry) {
    registry.register(NAME, Binutils, &[], true, defaults());
}

/// Release branches are named `binutils-2_25_1`
pub fn branch(version: &str) -> String {
    format!("binutils-{}", version.replace('.', "_"))
}

pub struct Binutils;

impl Recipe for Binutils {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        let prefix = settings.prefix()?;
        let version = settings.version()?;
        let target = settings.opt_str("target")?;

        let ld = bin_dir(&prefix).join(cross_tool(target, "ld"));
        let probe = VersionProbe::new(NAME, Cmd::argv([arg(&ld), "--version".to_string()]));
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
            .clone_repository(&GitSource::new(GIT_URL, &code_dir, branch(version)))?;

        let build_dir = code_dir.join("build");
        ensure_dir(&build_dir)?;
        let steps = BuildSteps::new(tools, &build_dir);

        let mut configure = vec![
            "../configure".to_string(),
            format!("--prefix={}", prefix.display()),
            "--disable-nls".to_string(),
        ];
        if let Some(target) = target {
            configure.push(format!("--target={}", target));
        }
        steps.run(configure)?;
        let jobs = job_count(settings)?.to_string();
        steps.run(["make", "all", "-j", jobs.as_str()])?;
        steps.run(["make", "install"])?;

        Ok(RecipeOutcome::Installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name() {
        assert_eq!(branch("2.25.1"), "binutils-2_25_1");
        assert_eq!(branch("2.26"), "binutils-2_26");
    }
}
