//! Built-in recipes
//!
//! | unit         | depends on   | installs                          |
//! |--------------|--------------|-----------------------------------|
//! | binutils     |              | `ld`, `as`, ... (optionally cross) |
//! | gcc          | binutils     | `gcc` (optionally cross)          |
//! | ninja        |              | `ninja`                           |
//! | meson        | ninja        | `meson` via pip3                  |
//! | qemu         |              | `qemu-system-arm`                 |
//! | crosstool-ng |              | `ct-ng`                           |
//! | ct-ng-build  | crosstool-ng | a crosstool-ng toolchain          |
//!
//! Sources live in `<temp>/<unit>`, downloads are cached in
//! `<temp>/_download`, binaries land in `<prefix>/bin`.

pub mod binutils;
pub mod crosstool_ng;
pub mod ct_ng_build;
pub mod gcc;
pub mod meson;
pub mod ninja;
pub mod qemu;

use crate::core::error::RecipeError;
use crate::core::output;
use crate::engine::registry::Registry;
use crate::helpers::Toolbox;
use crate::helpers::process::{Capture, Cmd, RunOptions};
use std::path::{Path, PathBuf};

/// Registry with every built-in unit
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    binutils::register(&mut registry);
    gcc::register(&mut registry);
    ninja::register(&mut registry);
    meson::register(&mut registry);
    qemu::register(&mut registry);
    crosstool_ng::register(&mut registry);
    ct_ng_build::register(&mut registry);
    registry
}

/// Runs a recipe's build commands in one directory, echoing each
pub(crate) struct BuildSteps<'t> {
    tools: &'t Toolbox,
    dir: PathBuf,
    capture: Capture,
}

impl<'t> BuildSteps<'t> {
    pub(crate) fn new(tools: &'t Toolbox, dir: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            dir: dir.into(),
            capture: Capture::Inherit,
        }
    }

    /// Throw away build output instead of streaming it
    pub(crate) fn silent(mut self, silent: bool) -> Self {
        self.capture = if silent { Capture::Discard } else { Capture::Inherit };
        self
    }

    pub(crate) fn run<I, S>(&self, args: I) -> Result<(), RecipeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let opts = RunOptions::default()
            .capture(self.capture)
            .dir(&self.dir)
            .echo();
        self.tools.runner().run(&Cmd::argv(args), &opts)?;
        Ok(())
    }
}

/// `rm -rf`, ignoring a missing directory
pub(crate) fn remove_dir_if_exists(dir: &Path) -> Result<(), RecipeError> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(RecipeError::io(format!("cannot remove {}", dir.display()))(e))
        }
        _ => Ok(()),
    }
}

/// A path as a command argument
pub(crate) fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Header line for a unit that is about to be built
pub(crate) fn announce(name: &str, version: &str) {
    output::action(&format!("installing {} {}", name, version));
}
