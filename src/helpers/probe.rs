//! Idempotency probe
//!
//! Asks an existing installation for its version before any build work.
//! A binary that is missing or fails to answer counts as "not installed";
//! the probe itself never fails.

use super::process::{Cmd, ProcessRunner, RunOptions};
use crate::core::output;

/// How the probe output is compared with the wanted version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionMatch {
    /// Output contains the version anywhere
    #[default]
    Contains,
    /// Output starts with the version, followed by whitespace or nothing
    Prefix,
}

impl VersionMatch {
    fn matches(self, output: &str, wanted: &str) -> bool {
        match self {
            VersionMatch::Contains => output.contains(wanted),
            VersionMatch::Prefix => output
                .trim_start()
                .strip_prefix(wanted)
                .is_some_and(|rest| rest.chars().next().is_none_or(char::is_whitespace)),
        }
    }
}

/// What the probe found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// Wanted version present; nothing to do
    UpToDate,
    /// Wanted version present but `force_install` is set
    Reinstall,
    /// Some other version answered
    Replace { found: String },
    /// Nothing answered
    Fresh,
}

impl ProbeVerdict {
    pub fn needs_install(&self) -> bool {
        !matches!(self, ProbeVerdict::UpToDate)
    }
}

/// Version query for one installed tool
#[derive(Debug, Clone)]
pub struct VersionProbe {
    name: String,
    command: Cmd,
    matching: VersionMatch,
}

impl VersionProbe {
    /// Probe `name` by running `command` (e.g. `gcc --version`)
    pub fn new(name: impl Into<String>, command: Cmd) -> Self {
        Self {
            name: name.into(),
            command,
            matching: VersionMatch::Contains,
        }
    }

    pub fn matching(mut self, matching: VersionMatch) -> Self {
        self.matching = matching;
        self
    }

    pub fn command(&self) -> &Cmd {
        &self.command
    }

    /// Run the query and report the verdict.
    pub fn check(&self, runner: &dyn ProcessRunner, wanted: &str, force_install: bool) -> ProbeVerdict {
        let verdict = match runner.run(&self.command, &RunOptions::piped()) {
            Err(_) => ProbeVerdict::Fresh,
            Ok(done) if self.matching.matches(&done.output, wanted) => {
                if force_install {
                    ProbeVerdict::Reinstall
                } else {
                    ProbeVerdict::UpToDate
                }
            }
            Ok(done) => ProbeVerdict::Replace {
                found: done.output.lines().next().unwrap_or("").trim().to_string(),
            },
        };

        match &verdict {
            ProbeVerdict::UpToDate => {
                output::skip(&format!("{} {} already installed", self.name, wanted))
            }
            ProbeVerdict::Reinstall => output::note(&format!(
                "{} {} already installed, reinstalling",
                self.name, wanted
            )),
            ProbeVerdict::Replace { found } => output::note(&format!(
                "found {} ({}), installing {}",
                self.name, found, wanted
            )),
            ProbeVerdict::Fresh => {
                output::detail(&format!("{} not found, installing {}", self.name, wanted))
            }
        }
        verdict
    }
}
