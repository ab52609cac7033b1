//! GCC (C and C++ only) built against bundled gmp, mpfr and mpc
//!
//! All four source archives come from ftp.gnu.org and are cached under
//! `<temp>/_download`, so a rebuild does not download them again. With a
//! `target` setting this builds a bare-metal cross compiler
//! (`--without-headers`), which is why only `all-gcc` and `libgcc` are built.

use super::{BuildSteps, announce, arg, remove_dir_if_exists};
use crate::core::error::RecipeError;
use crate::core::output;
use crate::engine::recipe::{Recipe, RecipeOutcome};
use crate::engine::registry::Registry;
use crate::engine::settings::Settings;
use crate::helpers::acquire::ArchiveSource;
use crate::helpers::probe::VersionProbe;
use crate::helpers::process::Cmd;
use crate::helpers::{Toolbox, bin_dir, cross_tool, ensure_dir, job_count};
use std::path::Path;

pub const NAME: &str = "gcc";

pub fn defaults() -> Settings {
    Settings::new()
        .with("version", "5.3.0")
        .with("gmp_version", "6.0.0a")
        .with("mpfr_version", "3.1.3")
        .with("mpc_version", "1.0.3")
        .with("silent", false)
}

pub fn register(registry: &mut Registry) {
    registry.register(NAME, Gcc, &["binutils"], true, defaults());
}

pub fn gcc_url(version: &str) -> String {
    format!("http://ftp.gnu.org/gnu/gcc/gcc-{0}/gcc-{0}.tar.bz2", version)
}

pub fn gmp_url(version: &str) -> String {
    format!("http://ftp.gnu.org/gnu/gmp/gmp-{}.tar.xz", version)
}

pub fn mpfr_url(version: &str) -> String {
    format!("http://ftp.gnu.org/gnu/mpfr/mpfr-{}.tar.xz", version)
}

pub fn mpc_url(version: &str) -> String {
    format!("http://ftp.gnu.org/gnu/mpc/mpc-{}.tar.gz", version)
}

/// `../configure` argv for a build inside `<tmp_dir>/gcc/build`
pub fn configure_args(prefix: &Path, tmp_dir: &Path, target: Option<&str>) -> Vec<String> {
    let gmp = tmp_dir.join("gmp");
    let mpfr = tmp_dir.join("mpfr");
    let mpc = tmp_dir.join("mpc");
    let mut args = vec![
        "../configure".to_string(),
        format!("--prefix={}", prefix.display()),
        format!("--with-gmp={}", gmp.display()),
        format!("--with-gmp-include={}", gmp.display()),
        format!("--with-mpfr={}", mpfr.display()),
        format!("--with-mpfr-include={}", mpfr.join("src").display()),
        format!("--with-mpc={}", mpc.display()),
        format!("--with-mpc-include={}", mpc.join("src").display()),
        "--disable-nls".to_string(),
        "--disable-multilib".to_string(),
        "--enable-languages=c,c++".to_string(),
        "--without-headers".to_string(),
    ];
    if let Some(target) = target {
        args.push(format!("--target={}", target));
    }
    args
}

pub struct Gcc;

impl Recipe for Gcc {
    fn run(&self, settings: &Settings, tools: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        let prefix = settings.prefix()?;
        let temp = settings.temp()?;
        let version = settings.version()?;
        let target = settings.opt_str("target")?;

        let gcc_bin = bin_dir(&prefix).join(cross_tool(target, "gcc"));
        let probe = VersionProbe::new(NAME, Cmd::argv([arg(&gcc_bin), "--version".to_string()]));
        if !probe
            .check(tools.runner(), version, settings.force_install()?)
            .needs_install()
        {
            return Ok(RecipeOutcome::UpToDate);
        }

        announce(NAME, version);
        let tmp_dir = match target {
            Some(t) => temp.join(format!("gcc-{}", t)),
            None => temp.join("gcc"),
        };
        let download_dir = temp.join("_download");
        remove_dir_if_exists(&tmp_dir)?;

        let sources = [
            ("gcc", gcc_url(version)),
            ("gmp", gmp_url(settings.str("gmp_version")?)),
            ("mpfr", mpfr_url(settings.str("mpfr_version")?)),
            ("mpc", mpc_url(settings.str("mpc_version")?)),
        ];
        for (dir, url) in sources {
            output::sub_action(&format!("fetching {}", dir));
            let source = ArchiveSource::new(url, tmp_dir.join(dir))
                .cache_dir(&download_dir)
                .strip_components(1);
            tools.acquirer().download_and_extract(&source)?;
        }

        let build_dir = tmp_dir.join("gcc").join("build");
        ensure_dir(&build_dir)?;

        let silent = settings.flag("silent")?;
        if silent {
            output::note("performing silent installation of gcc");
        }
        let steps = BuildSteps::new(tools, &build_dir).silent(silent);
        let jobs = job_count(settings)?.to_string();

        steps.run(configure_args(&prefix, &tmp_dir, target))?;
        steps.run(["make", "all-gcc", "-j", jobs.as_str()])?;
        steps.run(["make", "install-gcc"])?;
        steps.run(["make", "all-target-libgcc", "-j", jobs.as_str()])?;
        steps.run(["make", "install-target-libgcc"])?;

        Ok(RecipeOutcome::Installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            gcc_url("5.3.0"),
            "http://ftp.gnu.org/gnu/gcc/gcc-5.3.0/gcc-5.3.0.tar.bz2"
        );
        assert_eq!(gmp_url("6.0.0a"), "http://ftp.gnu.org/gnu/gmp/gmp-6.0.0a.tar.xz");
        assert_eq!(mpc_url("1.0.3"), "http://ftp.gnu.org/gnu/mpc/mpc-1.0.3.tar.gz");
    }

    #[test]
    fn test_configure_args_cross() {
        let args = configure_args(Path::new("/opt"), Path::new("/tmp/gcc-arm-eabi"), Some("arm-eabi"));
        assert_eq!(args[0], "../configure");
        assert!(args.contains(&"--prefix=/opt".to_string()));
        assert!(args.contains(&"--with-mpfr-include=/tmp/gcc-arm-eabi/mpfr/src".to_string()));
        assert_eq!(args.last().unwrap(), "--target=arm-eabi");
    }

    #[test]
    fn test_configure_args_native() {
        let args = configure_args(Path::new("/opt"), Path::new("/tmp/gcc"), None);
        assert_eq!(args.last().unwrap(), "--without-headers");
    }
}
