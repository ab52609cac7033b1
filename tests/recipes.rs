//! Built-in recipes against a scripted runner and a recording acquirer

mod common;

use common::{RecordingAcquirer, Reply, ScriptedRunner, call_log, entries, fake_toolbox, sandbox};
use std::cell::RefCell;
use std::rc::Rc;
use toolchain_installer::core::error::{InstallError, ProcessError};
use toolchain_installer::engine::{InstallSession, Recipe, RecipeOutcome, Settings};
use toolchain_installer::helpers::Toolbox;
use toolchain_installer::helpers::process::{Capture, Cmd, Completed, ProcessRunner, RunOptions};
use toolchain_installer::recipes::ct_ng_build::{self, CtNgBuild};
use toolchain_installer::recipes::default_registry;

fn answer_versions(command: &str) -> Reply {
    if command.ends_with("/bin/ld --version") {
        Reply::Ok("GNU ld (GNU Binutils) 2.25.1\n".to_string())
    } else if command.ends_with("/bin/gcc --version") {
        Reply::Ok("gcc (GCC) 5.3.0\nCopyright (C) 2015\n".to_string())
    } else {
        Reply::Missing
    }
}

#[test]
fn test_up_to_date_units_skip_all_work() {
    let log = call_log();
    let registry = default_registry();
    let (_tmp, global) = sandbox();

    let mut session = InstallSession::new(&registry, global)
        .with_toolbox(fake_toolbox(&log, ScriptedRunner::new(&log, answer_versions)));
    session.install("gcc").unwrap();

    let calls = entries(&log);
    assert_eq!(calls.len(), 2, "unexpected calls: {:?}", calls);
    assert!(calls[0].ends_with("/bin/ld --version"));
    assert!(calls[1].ends_with("/bin/gcc --version"));
}

#[test]
fn test_force_install_rebuilds_present_version() {
    let log = call_log();
    let registry = default_registry();
    let (_tmp, global) = sandbox();

    let mut session = InstallSession::new(&registry, global)
        .with_toolbox(fake_toolbox(&log, ScriptedRunner::new(&log, |cmd| match answer_versions(cmd) {
            Reply::Missing => Reply::Ok(String::new()),
            found => found,
        })))
        .with_unit_options("binutils", Settings::new().with("force_install", true));
    session.install("binutils").unwrap();

    let calls = entries(&log);
    assert_eq!(
        calls[1],
        "clone: git://sourceware.org/git/binutils-gdb.git binutils-2_25_1"
    );
    assert!(calls.iter().any(|c| c == "run: make install"));
}

#[test]
fn test_missing_gcc_is_downloaded_and_built() {
    let log = call_log();
    let registry = default_registry();
    let (tmp, global) = sandbox();

    let mut session = InstallSession::new(&registry, global)
        .with_toolbox(fake_toolbox(&log, ScriptedRunner::new(&log, gcc_missing)));
    session.install("gcc").unwrap();

    let calls = entries(&log);
    let downloads: Vec<&String> = calls.iter().filter(|c| c.starts_with("download: ")).collect();
    assert_eq!(
        downloads,
        [
            "download: http://ftp.gnu.org/gnu/gcc/gcc-5.3.0/gcc-5.3.0.tar.bz2",
            "download: http://ftp.gnu.org/gnu/gmp/gmp-6.0.0a.tar.xz",
            "download: http://ftp.gnu.org/gnu/mpfr/mpfr-3.1.3.tar.xz",
            "download: http://ftp.gnu.org/gnu/mpc/mpc-1.0.3.tar.gz",
        ]
    );

    let builds: Vec<&String> = calls
        .iter()
        .filter(|c| c.starts_with("run: ") && !c.ends_with("--version"))
        .collect();
    assert_eq!(builds.len(), 5, "unexpected build steps: {:?}", builds);
    assert!(builds[0].starts_with("run: ../configure "));
    assert!(builds[0].contains("--enable-languages=c,c++"));
    assert!(builds[1].starts_with("run: make all-gcc -j "));
    assert_eq!(builds[2], "run: make install-gcc");
    assert!(builds[3].starts_with("run: make all-target-libgcc -j "));
    assert_eq!(builds[4], "run: make install-target-libgcc");

    assert!(tmp.path().join("tmp/gcc/gcc/build").is_dir());
}

/// binutils is current, gcc is absent, every build command succeeds
fn gcc_missing(command: &str) -> Reply {
    if command.ends_with("/bin/gcc --version") {
        Reply::Missing
    } else if command.ends_with("--version") {
        answer_versions(command)
    } else {
        Reply::Ok(String::new())
    }
}

#[test]
fn test_gcc_build_failure_stops_later_targets() {
    let log = call_log();
    let registry = default_registry();
    let (_tmp, global) = sandbox();

    let script = |command: &str| {
        if command.starts_with("make all-gcc") {
            Reply::Exit(2, "xgcc: internal compiler error\n".to_string())
        } else {
            gcc_missing(command)
        }
    };
    let mut session = InstallSession::new(&registry, global)
        .with_toolbox(fake_toolbox(&log, ScriptedRunner::new(&log, script)));
    let err = session.install_all(&["gcc", "qemu"]).unwrap_err();

    assert_eq!(err.unit(), "gcc");
    assert!(matches!(err, InstallError::InstallFailed { .. }));
    assert!(err.to_string().contains("make all-gcc"));

    let calls = entries(&log);
    assert!(calls.last().unwrap().starts_with("run: make all-gcc"));
    assert!(!calls.iter().any(|c| c.contains("qemu")));
    assert!(!session.executed().contains(&"qemu".to_string()));
}

#[test]
fn test_ct_ng_build_without_target_exits_early() {
    let log = call_log();
    let (_tmp, global) = sandbox();
    let settings = Settings::merge([&ct_ng_build::defaults(), &global]);

    let outcome = CtNgBuild
        .run(&settings, &fake_toolbox(&log, ScriptedRunner::ok(&log)))
        .unwrap();

    assert!(matches!(outcome, RecipeOutcome::Exited(reason) if reason.contains("target")));
    assert!(entries(&log).is_empty());
}

#[test]
fn test_ct_ng_build_seeds_config_and_builds() {
    let log = call_log();
    let (tmp, global) = sandbox();
    let seed = tmp.path().join("arm.config");
    std::fs::write(&seed, "CT_ARCH_ARM=y\n").unwrap();

    let overrides = Settings::new()
        .with("target", "arm-unknown-eabi")
        .with("config", seed.as_path())
        .with("jobs", "3");
    let settings = Settings::merge([&ct_ng_build::defaults(), &global, &overrides]);

    let err = CtNgBuild
        .run(&settings, &fake_toolbox(&log, ScriptedRunner::new(&log, |_| Reply::Missing)))
        .unwrap_err();

    // the build step fails because the runner has no ct-ng, but the
    // configuration was seeded first
    let dst = tmp.path().join("opt/cross/arm-unknown-eabi");
    assert_eq!(
        std::fs::read_to_string(dst.join(".config")).unwrap(),
        "CT_ARCH_ARM=y\n"
    );
    let calls = entries(&log);
    assert_eq!(calls.len(), 2, "unexpected calls: {:?}", calls);
    assert!(calls[0].ends_with("/cross/arm-unknown-eabi/bin/arm-unknown-eabi-gcc --version"));
    assert!(calls[1].ends_with("/opt/bin/ct-ng build.3"));
    assert!(err.to_string().contains("ct-ng"));
}

#[test]
fn test_ct_ng_build_refuses_menuconfig_when_disabled() {
    let log = call_log();
    let (tmp, global) = sandbox();
    let overrides = Settings::new()
        .with("target", "arm-unknown-eabi")
        .with("no_menuconfig", true);
    let settings = Settings::merge([&ct_ng_build::defaults(), &global, &overrides]);

    let err = CtNgBuild
        .run(&settings, &fake_toolbox(&log, ScriptedRunner::new(&log, |_| Reply::Missing)))
        .unwrap_err();

    assert!(err.to_string().contains(".config"));
    assert!(!tmp.path().join("opt/cross").exists());
}

/// Stands in for an interactive `ct-ng menuconfig` that saves a `.config`
struct Menuconfig {
    capture: Rc<RefCell<Option<Capture>>>,
}

impl ProcessRunner for Menuconfig {
    fn run(&self, cmd: &Cmd, opts: &RunOptions) -> Result<Completed, ProcessError> {
        let command = cmd.display();
        if command.ends_with("--version") {
            return Err(ProcessError::Spawn {
                command,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        if command.ends_with(" menuconfig") {
            *self.capture.borrow_mut() = Some(opts.capture);
            let dir = opts.cwd.as_ref().expect("menuconfig runs in the build dir");
            std::fs::write(dir.join(".config"), "CT_ARCH_ARM=y\n").unwrap();
        }
        Ok(Completed {
            command,
            exit_code: Some(0),
            output: String::new(),
        })
    }
}

#[test]
fn test_ct_ng_menuconfig_gets_the_terminal() {
    let log = call_log();
    let (tmp, global) = sandbox();
    let overrides = Settings::new().with("target", "arm-unknown-eabi");
    let settings = Settings::merge([&ct_ng_build::defaults(), &global, &overrides]);

    let capture = Rc::new(RefCell::new(None));
    let tools = Toolbox::new(
        Menuconfig {
            capture: capture.clone(),
        },
        RecordingAcquirer::new(&log),
    );
    let outcome = CtNgBuild.run(&settings, &tools).unwrap();

    assert!(matches!(outcome, RecipeOutcome::Installed));
    let capture = capture.borrow().expect("menuconfig was not run");
    assert_eq!(capture, Capture::Inherit);
    assert!(capture.inherits_stdin());
    assert!(tmp.path().join("opt/cross/arm-unknown-eabi/.config").is_file());
}
