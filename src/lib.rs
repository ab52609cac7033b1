//! Developer toolchain installer
//!
//! Fetches, builds and installs compilers, build tools and emulators into a
//! user prefix. Each tool is a *unit* with a recipe and a list of
//! dependencies; an install session runs every unit at most once,
//! dependencies first.
//!
//! # Example
//!
//! ```no_run
//! use toolchain_installer::engine::{InstallSession, Settings};
//! use toolchain_installer::recipes::default_registry;
//! use std::path::Path;
//!
//! let registry = default_registry();
//! let global = Settings::baseline(Path::new("/opt/tools"), Path::new("/tmp/src"))
//!     .with("target", "arm-eabi");
//! let mut session = InstallSession::new(&registry, global)
//!     .with_unit_options("gcc", Settings::new().with("version", "5.2.0"));
//! session.install("gcc")?;
//! # Ok::<(), toolchain_installer::core::error::InstallError>(())
//! ```
//!
//! # Settings
//!
//! A recipe sees three layers merged, later ones winning per key:
//! the unit's defaults, the session-global options (`prefix`, `temp`,
//! `force_install`, `dry`, anything given with `--set`) and the per-unit
//! overrides (`--gcc:version=5.2.0`).
//!
//! # Custom recipes
//!
//! Anything implementing [`engine::Recipe`], including a plain function with
//! the right signature, can be registered:
//!
//! ```
//! use toolchain_installer::core::error::RecipeError;
//! use toolchain_installer::engine::{RecipeOutcome, Registry, Settings};
//! use toolchain_installer::helpers::Toolbox;
//!
//! fn hello(_: &Settings, _: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
//!     Ok(RecipeOutcome::Installed)
//! }
//!
//! let mut registry = Registry::new();
//! registry.register("hello", hello, &[], true, Settings::new());
//! assert!(registry.contains("hello"));
//! ```

pub mod core;
pub mod engine;
pub mod helpers;
pub mod recipes;

pub use crate::core::output;
pub use engine::{InstallSession, Registry, Settings};
