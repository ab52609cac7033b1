//! External process execution
//!
//! Every build step a recipe performs goes through a [`ProcessRunner`], so
//! tests can script and record commands instead of spawning them.
//!
//! ```ignore
//! tools.runner().run(
//!     &Cmd::argv(["make", "install"]),
//!     &RunOptions::default().dir(&build_dir).echo(),
//! )?;
//! ```

use crate::core::error::ProcessError;
use crate::core::output;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Interpreted by `sh -c`
    Shell(String),
    /// Program followed by its arguments
    Argv(Vec<String>),
}

impl Cmd {
    pub fn shell(cmd: impl Into<String>) -> Self {
        Cmd::Shell(cmd.into())
    }

    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cmd::Argv(args.into_iter().map(Into::into).collect())
    }

    /// Human-readable form, shell-quoted where needed
    pub fn display(&self) -> String {
        match self {
            Cmd::Shell(s) => s.clone(),
            Cmd::Argv(args) => shlex::try_join(args.iter().map(String::as_str))
                .unwrap_or_else(|_| args.join(" ")),
        }
    }

    /// Render as a single `sh -c` script, quoting argv tokens
    pub fn to_shell(&self) -> Result<String, ProcessError> {
        match self {
            Cmd::Shell(s) => Ok(s.clone()),
            Cmd::Argv(args) => {
                let quoted = args
                    .iter()
                    .map(|a| {
                        shlex::try_quote(a)
                            .map(|q| q.into_owned())
                            .map_err(|_| ProcessError::Quote(a.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(quoted.join(" "))
            }
        }
    }
}

/// What happens to a child's stdout and stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Capture {
    /// Stream to the terminal
    #[default]
    Inherit,
    /// Capture into [`Completed::output`]
    Piped,
    /// Throw away
    Discard,
}

impl Capture {
    /// Only commands attached to the terminal get its stdin, so interactive
    /// tools like `ct-ng menuconfig` work and captured ones never block on it
    pub fn inherits_stdin(self) -> bool {
        self == Capture::Inherit
    }
}

/// How to run a [`Cmd`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub capture: Capture,
    /// Fail with `CommandFailed` on a non-zero exit
    pub check: bool,
    /// Run an argv command through `sh -c` after quoting it
    pub shell: bool,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    /// Print `$ cmd` before running
    pub echo: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capture: Capture::Inherit,
            check: true,
            shell: false,
            cwd: None,
            env: BTreeMap::new(),
            echo: false,
        }
    }
}

impl RunOptions {
    pub fn piped() -> Self {
        Self {
            capture: Capture::Piped,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            capture: Capture::Discard,
            ..Self::default()
        }
    }

    pub fn unchecked(mut self) -> Self {
        self.check = false;
        self
    }

    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn echo(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn shell(mut self) -> Self {
        self.shell = true;
        self
    }

    pub fn capture(mut self, capture: Capture) -> Self {
        self.capture = capture;
        self
    }
}

/// Result of a command that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub command: String,
    /// `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
    /// stdout and stderr interleaved as written; empty unless captured
    pub output: String,
}

impl Completed {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external processes on behalf of recipes
pub trait ProcessRunner {
    fn run(&self, cmd: &Cmd, opts: &RunOptions) -> Result<Completed, ProcessError>;
}

/// Runs commands on the host with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn build_command(&self, cmd: &Cmd, opts: &RunOptions) -> Result<Command, ProcessError> {
        let mut command = match cmd {
            Cmd::Shell(script) => {
                let mut c = Command::new("sh");
                c.args(["-c", script]);
                c
            }
            Cmd::Argv(_) if opts.shell => {
                let mut c = Command::new("sh");
                c.args(["-c", &cmd.to_shell()?]);
                c
            }
            Cmd::Argv(args) => {
                let Some((program, rest)) = args.split_first() else {
                    return Err(ProcessError::Spawn {
                        command: String::new(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "empty command",
                        ),
                    });
                };
                let mut c = Command::new(program);
                c.args(rest);
                c
            }
        };

        if let Some(ref cwd) = opts.cwd {
            command.current_dir(cwd);
        }
        for (k, v) in &opts.env {
            command.env(k, v);
        }
        if opts.capture.inherits_stdin() {
            command.stdin(Stdio::inherit());
        } else {
            command.stdin(Stdio::null());
        }

        // Piped output is wired up in `run`, where the shared pipe is read
        match opts.capture {
            Capture::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            Capture::Piped => {}
            Capture::Discard => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        Ok(command)
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &Cmd, opts: &RunOptions) -> Result<Completed, ProcessError> {
        let display = cmd.display();
        if opts.echo {
            output::command(&display);
        }

        let mut command = self.build_command(cmd, opts)?;
        let spawn_error = |source| ProcessError::Spawn {
            command: display.clone(),
            source,
        };

        let (exit_code, captured) = if opts.capture == Capture::Piped {
            // one pipe for both streams keeps them in the order written (2>&1)
            let (mut reader, writer) = std::io::pipe().map_err(spawn_error)?;
            command
                .stdout(writer.try_clone().map_err(spawn_error)?)
                .stderr(writer);
            let mut child = command.spawn().map_err(spawn_error)?;
            // the command still owns the write ends
            drop(command);

            let mut bytes = Vec::new();
            let read = reader.read_to_end(&mut bytes);
            let status = child.wait().map_err(spawn_error)?;
            read.map_err(spawn_error)?;
            (status.code(), String::from_utf8_lossy(&bytes).into_owned())
        } else {
            let status = command.status().map_err(spawn_error)?;
            (status.code(), String::new())
        };

        if opts.check && exit_code != Some(0) {
            return Err(ProcessError::CommandFailed {
                command: display,
                exit_code,
                output: (opts.capture == Capture::Piped).then_some(captured),
            });
        }

        Ok(Completed {
            command: display,
            exit_code,
            output: captured,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_piped_output_is_captured() {
        let done = SystemRunner
            .run(&Cmd::shell("echo hello; echo oops >&2"), &RunOptions::piped())
            .unwrap();
        assert!(done.success());
        assert_eq!(done.output, "hello\noops\n");
    }

    #[test]
    fn test_piped_streams_keep_write_order() {
        let done = SystemRunner
            .run(
                &Cmd::shell("echo one; echo two >&2; echo three"),
                &RunOptions::piped(),
            )
            .unwrap();
        assert_eq!(done.output, "one\ntwo\nthree\n");
    }

    #[test]
    fn test_only_inherited_capture_gets_stdin() {
        assert!(Capture::Inherit.inherits_stdin());
        assert!(!Capture::Piped.inherits_stdin());
        assert!(!Capture::Discard.inherits_stdin());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_inherited_stdin_is_the_parents() {
        // exits non-zero unless the child's stdin is the test process's stdin
        let same_stdin = "test \"$(readlink -f /proc/self/fd/0)\" = \"$(readlink -f /proc/$PPID/fd/0)\"";
        SystemRunner
            .run(&Cmd::shell(same_stdin), &RunOptions::default())
            .unwrap();

        let done = SystemRunner
            .run(&Cmd::shell("readlink -f /proc/self/fd/0"), &RunOptions::piped())
            .unwrap();
        assert_eq!(done.output.trim(), "/dev/null");
    }

    #[test]
    fn test_argv_runs_without_shell() {
        let done = SystemRunner
            .run(&Cmd::argv(["echo", "a b", "$HOME"]), &RunOptions::piped())
            .unwrap();
        assert_eq!(done.output, "a b $HOME\n");
    }

    #[test]
    fn test_argv_through_shell_is_quoted() {
        let done = SystemRunner
            .run(
                &Cmd::argv(["echo", "a;b", "$HOME"]),
                &RunOptions::piped().shell(),
            )
            .unwrap();
        assert_eq!(done.output, "a;b $HOME\n");
    }

    #[test]
    fn test_nonzero_exit_fails_when_checked() {
        let err = SystemRunner
            .run(&Cmd::shell("echo broken; exit 3"), &RunOptions::piped())
            .unwrap_err();
        match err {
            ProcessError::CommandFailed {
                exit_code, output, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(output.as_deref(), Some("broken\n"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unchecked_returns_exit_code() {
        let done = SystemRunner
            .run(&Cmd::shell("exit 7"), &RunOptions::silent().unchecked())
            .unwrap();
        assert_eq!(done.exit_code, Some(7));
        assert!(!done.success());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = SystemRunner
            .run(
                &Cmd::argv(["definitely-not-a-real-program-xyz", "--version"]),
                &RunOptions::piped(),
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn test_dir_and_env() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker"), "").unwrap();
        let done = SystemRunner
            .run(
                &Cmd::shell("ls; echo $GREETING"),
                &RunOptions::piped().dir(tmp.path()).env("GREETING", "hi"),
            )
            .unwrap();
        assert_eq!(done.output, "marker\nhi\n");
    }

    #[test]
    fn test_display_quotes_argv() {
        let cmd = Cmd::argv(["configure", "--prefix=/opt/my tools"]);
        assert_eq!(
            shlex::split(&cmd.display()).unwrap(),
            vec!["configure", "--prefix=/opt/my tools"]
        );
        assert_eq!(Cmd::shell("make -j4").display(), "make -j4");
    }

    #[test]
    fn test_nul_byte_cannot_be_quoted() {
        let err = Cmd::argv(["echo", "a\0b"]).to_shell().unwrap_err();
        assert!(matches!(err, ProcessError::Quote(_)));
    }
}
