//! Shallow git checkouts

use super::GitSource;
use crate::core::error::FetchError;
use crate::core::output::{self, ProgressGuard};
use crate::helpers::process::{Cmd, ProcessRunner, RunOptions};

const MAX_DEPTH: u32 = 1_000_000;

/// Validate that a URL uses a scheme git can fetch from.
fn validate_git_url(url: &str) -> Result<(), FetchError> {
    const SCHEMES: [&str; 5] = ["https://", "http://", "ssh://", "git://", "git@"];
    if SCHEMES.iter().any(|s| url.starts_with(s)) {
        Ok(())
    } else {
        Err(FetchError::UnsupportedUrl(url.to_string()))
    }
}

/// Build the `git clone` argv for `source`
pub fn clone_command(source: &GitSource) -> Cmd {
    let mut args = vec![
        "git".to_string(),
        "clone".to_string(),
        source.url.clone(),
        source.target_dir.to_string_lossy().into_owned(),
        "--branch".to_string(),
        source.reference.clone(),
        "--depth".to_string(),
        source.depth.to_string(),
    ];
    if source.recursive {
        args.push("--recursive".to_string());
    }
    Cmd::Argv(args)
}

/// Replace `source.target_dir` with a fresh shallow clone.
pub fn clone(runner: &dyn ProcessRunner, source: &GitSource) -> Result<(), FetchError> {
    if source.depth == 0 || source.depth > MAX_DEPTH {
        return Err(FetchError::InvalidDepth(source.depth));
    }
    validate_git_url(&source.url)?;

    if source.target_dir.exists() {
        std::fs::remove_dir_all(&source.target_dir).map_err(|e| FetchError::Io {
            context: format!("cannot remove {}", source.target_dir.display()),
            source: e,
        })?;
    }
    if let Some(parent) = source.target_dir.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| FetchError::Io {
            context: format!("cannot create {}", parent.display()),
            source: e,
        })?;
    }

    output::detail(&format!(
        "git clone {} ({}, depth {})",
        source.url, source.reference, source.depth
    ));
    let _guard = ProgressGuard(output::spinner(&format!("cloning {}", source.reference)));

    runner
        .run(&clone_command(source), &RunOptions::piped())
        .map_err(|e| FetchError::Clone {
            url: source.url.clone(),
            source: e,
        })?;

    Ok(())
}
