//! Source acquisition
//!
//! Recipes pick one of two strategies:
//!
//! - **clone_repository**: shallow git checkout of a branch or tag
//! - **download_and_extract**: fetch an archive over HTTP(S), optionally from
//!   a download cache, and unpack it natively
//!
//! Both sit behind [`SourceAcquirer`] so tests can record fetches without
//! touching the network.

pub mod download;
pub mod extract;
pub mod git;

use super::process::{ProcessRunner, SystemRunner};
use crate::core::error::FetchError;
use std::path::PathBuf;

/// A git checkout to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
    pub url: String,
    pub target_dir: PathBuf,
    /// Branch or tag to check out
    pub reference: String,
    pub depth: u32,
    pub recursive: bool,
}

impl GitSource {
    /// Shallow (depth 5), recursive clone of `reference`
    pub fn new(url: impl Into<String>, target_dir: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target_dir: target_dir.into(),
            reference: reference.into(),
            depth: 5,
            recursive: true,
        }
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// An archive to download and unpack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    pub url: String,
    pub target_dir: PathBuf,
    /// Directory holding previously downloaded archives
    pub cache_dir: Option<PathBuf>,
    /// Leading path components dropped from every entry
    pub strip_components: usize,
}

impl ArchiveSource {
    pub fn new(url: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            target_dir: target_dir.into(),
            cache_dir: None,
            strip_components: 0,
        }
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn strip_components(mut self, n: usize) -> Self {
        self.strip_components = n;
        self
    }
}

/// Fetches recipe sources
pub trait SourceAcquirer {
    fn clone_repository(&self, source: &GitSource) -> Result<(), FetchError>;
    fn download_and_extract(&self, source: &ArchiveSource) -> Result<(), FetchError>;
}

/// Real acquirer: `git` through a process runner, HTTP through ureq
pub struct SystemAcquirer {
    runner: Box<dyn ProcessRunner>,
}

impl SystemAcquirer {
    pub fn new() -> Self {
        Self::with_runner(SystemRunner)
    }

    /// Run `git` through `runner` instead of the host runner
    pub fn with_runner(runner: impl ProcessRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }
}

impl Default for SystemAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAcquirer for SystemAcquirer {
    fn clone_repository(&self, source: &GitSource) -> Result<(), FetchError> {
        git::clone(self.runner.as_ref(), source)
    }

    fn download_and_extract(&self, source: &ArchiveSource) -> Result<(), FetchError> {
        let archive = download::fetch(&source.url, source.cache_dir.as_deref())?;
        extract::extract_archive(archive.path(), &source.target_dir, source.strip_components)
    }
}
