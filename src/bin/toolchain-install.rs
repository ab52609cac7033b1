//! toolchain-install - build and install developer tools into a prefix
//!
//! Usage:
//!   toolchain-install gcc                      Install gcc (and binutils first)
//!   toolchain-install all                      Install every default unit
//!   toolchain-install --dry all                Print the plan, run nothing
//!   toolchain-install gcc --gcc:version=5.2.0  Override one unit's setting
//!   toolchain-install --list                   Show the available units

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use toolchain_installer::core::error::UsageError;
use toolchain_installer::core::lock::acquire_session_lock;
use toolchain_installer::core::output;
use toolchain_installer::engine::options::{
    expand_path, expand_targets, parse_assignment, split_unit_overrides,
};
use toolchain_installer::engine::settings::{DRY, FORCE_INSTALL};
use toolchain_installer::engine::{InstallSession, Registry, Settings, find_cycle, install_order};
use toolchain_installer::recipes::default_registry;

#[derive(Parser)]
#[command(name = "toolchain-install")]
#[command(about = "Fetch, build and install developer toolchains into a prefix")]
#[command(version)]
#[command(after_help = "Per-unit settings: --<unit>:<key>=<value>, e.g. --gcc:version=5.2.0")]
struct Cli {
    /// Units to install, or `all` for every default unit
    #[arg(required_unless_present = "list")]
    units: Vec<String>,

    /// Installation prefix
    #[arg(long, env = "TOOLCHAIN_PREFIX", default_value = "~/opt")]
    prefix: String,

    /// Scratch directory for sources, builds and downloads
    #[arg(long, env = "TOOLCHAIN_TEMP", default_value = "~/tmp")]
    temp: String,

    /// Reinstall even if the requested version is already present
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    force_install: Option<bool>,

    /// Resolve and print the plan without running any recipe
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    dry: Option<bool>,

    /// Extra global setting for every unit (repeatable), e.g. --set target=arm-eabi
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Refuse to run if the requested units reach a dependency cycle
    #[arg(long)]
    strict_deps: bool,

    /// List the available units and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&format!("{:#}", err));
            if err.downcast_ref::<UsageError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run() -> Result<()> {
    let registry = default_registry();

    // `--gcc:version=...` style options are not known to clap
    let (args, unit_options) = split_unit_overrides(std::env::args(), &registry)?;
    let cli = Cli::parse_from(args);

    if cli.list {
        print_units(&registry);
        return Ok(());
    }

    let targets = expand_targets(&registry, &cli.units)?;
    let prefix = expand_path(&cli.prefix);
    let temp = expand_path(&cli.temp);

    let mut global = Settings::baseline(&prefix, &temp);
    for raw in &cli.set {
        let (key, value) = parse_assignment(raw)?;
        global.set(&key, value);
    }
    if let Some(force) = cli.force_install {
        global.set(FORCE_INSTALL, force);
    }
    if let Some(dry) = cli.dry {
        global.set(DRY, dry);
    }

    if cli.strict_deps
        && let Some(cycle) = find_cycle(&registry, &targets)
    {
        return Err(UsageError::Cycle(cycle).into());
    }

    let order = install_order(&registry, &targets)?;
    output::info(&format!("install order: {}", order.join(" -> ")));
    output::detail(&format!("prefix {}", prefix.display()));
    output::detail(&format!("temp   {}", temp.display()));

    global.dry().context("invalid --dry value")?;
    let mut session = InstallSession::new(&registry, global);
    for (unit, options) in unit_options {
        session.set_unit_options(&unit, options);
    }

    // dry runs must not touch the filesystem, not even for the lock; a
    // per-unit `--<unit>:dry=false` makes this a real run
    let dry = session.is_dry_run(&order);
    let _lock = if dry {
        None
    } else {
        Some(acquire_session_lock(&temp)?)
    };

    let total = targets.len();
    for (i, name) in targets.iter().enumerate() {
        output::action_numbered(i + 1, total, name);
        session.install(name)?;
    }

    if dry {
        output::success(&format!("dry run complete, {} unit(s) planned", session.executed().len()));
    } else {
        output::success(&format!("{} unit(s) processed", session.executed().len()));
    }
    Ok(())
}

fn print_units(registry: &Registry) {
    output::action("available units");
    for unit in registry.units() {
        let mut detail = match unit.default_settings().version() {
            Ok(version) => version.to_string(),
            Err(_) => String::new(),
        };
        if !unit.dependencies().is_empty() {
            detail.push_str(&format!(" (needs {})", unit.dependencies().join(", ")));
        }
        if !unit.default_install() {
            detail.push_str(" [not in all]");
        }
        output::list_item(unit.name(), &detail, unit.default_install());
    }
}
