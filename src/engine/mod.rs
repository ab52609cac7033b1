//! Orchestration engine
//!
//! The [`Registry`] maps unit names to recipes and dependencies; an
//! [`InstallSession`] walks it, merging [`Settings`] layers and running each
//! recipe at most once, dependencies first.

pub mod options;
pub mod plan;
pub mod recipe;
pub mod registry;
pub mod session;
pub mod settings;

pub use plan::{WouldCycle, find_cycle, install_order};
pub use recipe::{Recipe, RecipeOutcome};
pub use registry::{Registry, Unit};
pub use session::InstallSession;
pub use settings::{Settings, Value};
