//! Shared fakes for integration tests
//!
//! Nothing here touches the network or spawns a real compiler: commands go
//! to a scripted runner, fetches to a recording acquirer, and recipes append
//! their name to a shared call log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;
use toolchain_installer::core::error::{FetchError, ProcessError, RecipeError};
use toolchain_installer::engine::{Recipe, RecipeOutcome, Settings};
use toolchain_installer::helpers::Toolbox;
use toolchain_installer::helpers::acquire::{ArchiveSource, GitSource, SourceAcquirer};
use toolchain_installer::helpers::process::{Cmd, Completed, ProcessRunner, RunOptions};

/// Shared, ordered log of events
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.borrow().clone()
}

/// How the scripted runner answers one command
pub enum Reply {
    /// Exit 0 with this output
    Ok(String),
    /// Exit with this code and output
    Exit(i32, String),
    /// The program does not exist
    Missing,
}

type Script = Box<dyn Fn(&str) -> Reply>;

/// Records every command (as displayed) and answers from a script
pub struct ScriptedRunner {
    log: CallLog,
    script: Script,
}

impl ScriptedRunner {
    /// Every command succeeds with empty output
    pub fn ok(log: &CallLog) -> Self {
        Self::new(log, |_| Reply::Ok(String::new()))
    }

    pub fn new(log: &CallLog, script: impl Fn(&str) -> Reply + 'static) -> Self {
        Self {
            log: log.clone(),
            script: Box::new(script),
        }
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, cmd: &Cmd, opts: &RunOptions) -> Result<Completed, ProcessError> {
        let command = cmd.display();
        self.log.borrow_mut().push(format!("run: {}", command));
        match (self.script)(&command) {
            Reply::Ok(output) => Ok(Completed {
                command,
                exit_code: Some(0),
                output,
            }),
            Reply::Exit(code, output) if !opts.check => Ok(Completed {
                command,
                exit_code: Some(code),
                output,
            }),
            Reply::Exit(code, output) => Err(ProcessError::CommandFailed {
                command,
                exit_code: Some(code),
                output: Some(output),
            }),
            Reply::Missing => Err(ProcessError::Spawn {
                command,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

/// Records fetches; creates the target directory like a real fetch would
pub struct RecordingAcquirer {
    log: CallLog,
}

impl RecordingAcquirer {
    pub fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl SourceAcquirer for RecordingAcquirer {
    fn clone_repository(&self, source: &GitSource) -> Result<(), FetchError> {
        self.log
            .borrow_mut()
            .push(format!("clone: {} {}", source.url, source.reference));
        create(&source.target_dir)
    }

    fn download_and_extract(&self, source: &ArchiveSource) -> Result<(), FetchError> {
        self.log.borrow_mut().push(format!("download: {}", source.url));
        create(&source.target_dir)
    }
}

fn create(dir: &Path) -> Result<(), FetchError> {
    std::fs::create_dir_all(dir).map_err(|e| FetchError::Io {
        context: format!("cannot create {}", dir.display()),
        source: e,
    })
}

/// Toolbox whose runner and acquirer both write to `log`
pub fn fake_toolbox(log: &CallLog, runner: ScriptedRunner) -> Toolbox {
    Toolbox::new(runner, RecordingAcquirer::new(log))
}

/// Recipe that logs its name and finishes with a fixed result
pub struct FakeRecipe {
    name: String,
    log: CallLog,
    fail: bool,
}

impl FakeRecipe {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            fail: false,
        }
    }

    /// Fails the way a broken compile step does
    pub fn failing(name: &str, log: &CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(name, log)
        }
    }
}

impl Recipe for FakeRecipe {
    fn run(&self, _: &Settings, _: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        self.log.borrow_mut().push(self.name.clone());
        if self.fail {
            return Err(ProcessError::CommandFailed {
                command: "make all-gcc".to_string(),
                exit_code: Some(2),
                output: Some("internal compiler error".to_string()),
            }
            .into());
        }
        Ok(RecipeOutcome::Installed)
    }
}

/// Global settings rooted in a fresh temporary directory
pub fn sandbox() -> (TempDir, Settings) {
    let tmp = TempDir::new().expect("create temp dir");
    let settings = Settings::baseline(&tmp.path().join("opt"), &tmp.path().join("tmp"));
    (tmp, settings)
}
