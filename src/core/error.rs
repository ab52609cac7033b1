//! Installer error types.
//!
//! Library code returns these typed errors; the binary decides exit codes.
//! Each `Display` already includes its cause, so callers print only the top
//! level.

use crate::engine::plan::WouldCycle;
use crate::engine::settings::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from running an external process.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed: {command} (exit code: {})", describe_code(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        /// Captured stdout+stderr, when the command ran piped.
        output: Option<String>,
    },

    #[error("cannot quote argument for the shell: {0:?}")]
    Quote(String),
}

impl ProcessError {
    /// Output captured before the failure, if any.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            ProcessError::CommandFailed { output, .. } => output.as_deref(),
            _ => None,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "killed by signal".to_string(),
    }
}

/// Errors from fetching sources (version control, download, extraction).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(
        "unsupported source URL: {0} (only https://, http://, ssh://, git:// and git@ are supported)"
    )]
    UnsupportedUrl(String),

    #[error("clone depth must be between 1 and 1000000, got {0}")]
    InvalidDepth(u32),

    #[error("git clone failed for {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: ProcessError,
    },

    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("cannot extract {}: {reason}", .archive.display())]
    Extract { archive: PathBuf, reason: String },

    #[error("cannot detect archive format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn extract(archive: &std::path::Path, reason: impl Into<String>) -> Self {
        FetchError::Extract {
            archive: archive.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Errors from reading merged settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("missing setting '{key}'")]
    Missing { key: String },

    #[error("setting '{key}' must be a {expected}, got {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: Value,
    },
}

/// Any failure raised while a recipe runs.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

impl RecipeError {
    /// Build a `map_err` adapter that attaches context to an I/O error.
    pub fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> RecipeError {
        let context = context.into();
        move |source| RecipeError::Io { context, source }
    }

    /// Output captured from the failing command, if this error carries one.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            RecipeError::Process(e) => e.captured_output(),
            RecipeError::Fetch(FetchError::Clone { source, .. }) => source.captured_output(),
            _ => None,
        }
    }
}

/// Errors that end an install session.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("no installer for '{name}'{} available", required_by(.requested_by))]
    UnitNotFound {
        name: String,
        requested_by: Option<String>,
    },

    #[error("failed to install '{name}': {cause}")]
    InstallFailed {
        name: String,
        #[source]
        cause: RecipeError,
    },
}

impl InstallError {
    /// Name of the unit the failure is attributed to.
    pub fn unit(&self) -> &str {
        match self {
            InstallError::UnitNotFound { name, .. } => name,
            InstallError::InstallFailed { name, .. } => name,
        }
    }
}

fn required_by(requested_by: &Option<String>) -> String {
    match requested_by {
        Some(parent) => format!(" (required by '{}')", parent),
        None => String::new(),
    }
}

/// Command-line mistakes, detected before any unit runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("invalid option '{0}'")]
    InvalidOption(String),

    #[error("unknown tool '{unit}' in option '{option}'")]
    UnknownUnit { unit: String, option: String },

    #[error("no installer for '{0}' available")]
    UnknownTarget(String),

    #[error("invalid assignment '{0}', expected KEY=VALUE")]
    InvalidAssignment(String),

    #[error("no units requested")]
    NothingRequested,

    #[error("dependency cycle detected: {0}")]
    Cycle(WouldCycle),
}
