//! Native archive extraction
//!
//! Supports tar (plain, gz, xz, bz2, zst) and zip without external tools.
//! Entries may have leading path components stripped, the way
//! `tar --strip-components` does. Paths and link targets that would land
//! outside the destination are rejected.

use crate::core::error::FetchError;
use crate::core::output::{self, ProgressGuard};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Archive container and compression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from a file name extension
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        let format = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            ArchiveFormat::TarXz
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            ArchiveFormat::TarBz2
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            ArchiveFormat::TarZst
        } else if name.ends_with(".tar") {
            ArchiveFormat::Tar
        } else if name.ends_with(".zip") {
            ArchiveFormat::Zip
        } else {
            return None;
        };
        Some(format)
    }
}

/// Extract `archive` into `dest`, dropping `strip` leading components.
///
/// Entries with no components left after stripping are skipped.
pub fn extract_archive(archive: &Path, dest: &Path, strip: usize) -> Result<(), FetchError> {
    let format =
        ArchiveFormat::detect(archive).ok_or_else(|| FetchError::UnsupportedFormat(archive.to_path_buf()))?;

    std::fs::create_dir_all(dest).map_err(|e| FetchError::Io {
        context: format!("cannot create {}", dest.display()),
        source: e,
    })?;

    let filename = archive
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let guard = ProgressGuard(output::spinner(&format!("extracting {}", filename)));

    let file = File::open(archive).map_err(|e| FetchError::extract(archive, e.to_string()))?;
    let reader = BufReader::new(file);
    let fail = |reason: String| FetchError::extract(archive, reason);

    match format {
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(reader), dest, strip),
        ArchiveFormat::TarXz => extract_tar(xz2::read::XzDecoder::new(reader), dest, strip),
        ArchiveFormat::TarBz2 => extract_tar(bzip2::read::BzDecoder::new(reader), dest, strip),
        ArchiveFormat::TarZst => {
            let decoder = zstd::stream::read::Decoder::new(reader)
                .map_err(|e| format!("zstd init error: {}", e))
                .map_err(fail)?;
            extract_tar(decoder, dest, strip)
        }
        ArchiveFormat::Tar => extract_tar(reader, dest, strip),
        ArchiveFormat::Zip => extract_zip(reader, dest, strip),
    }
    .map_err(fail)?;

    drop(guard);
    output::detail(&format!("extracted {} to {}", filename, dest.display()));
    Ok(())
}

/// Drop `n` leading components. `None` when nothing is left.
fn strip_path(path: &Path, n: usize) -> Option<PathBuf> {
    let rest: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .skip(n)
        .collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

fn is_unsafe(path: &Path) -> bool {
    path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

/// Lexical normalization; never touches the filesystem.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Reject writes through a symlink that already exists under `dest`
fn ensure_no_symlink_components(dest: &Path, rel: &Path) -> Result<(), String> {
    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(format!("symlink in path component: {}", cur.display()));
        }
    }
    Ok(())
}

fn ensure_symlink_target_within(dest: &Path, link_parent: &Path, target: &Path) -> Result<(), String> {
    if target.has_root() {
        return Err(format!("absolute link target: {}", target.display()));
    }
    let candidate = normalize_lexical(&link_parent.join(target));
    if candidate.strip_prefix(normalize_lexical(dest)).is_err() {
        return Err(format!(
            "link target escapes destination: {} -> {}",
            link_parent.display(),
            target.display()
        ));
    }
    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path, strip: usize) -> Result<(), String> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries().map_err(|e| format!("tar read error: {}", e))? {
        let mut entry = entry.map_err(|e| format!("tar entry error: {}", e))?;
        let path = entry
            .path()
            .map_err(|e| format!("tar path error: {}", e))?
            .into_owned();

        if is_unsafe(&path) {
            return Err(format!("unsafe path: {}", path.display()));
        }
        let Some(rel) = strip_path(&path, strip) else {
            continue;
        };
        let full_path = dest.join(&rel);
        ensure_no_symlink_components(dest, &rel)?;

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
        }

        match entry.header().entry_type() {
            tar::EntryType::Symlink => {
                let target = entry
                    .link_name()
                    .map_err(|e| format!("tar link error: {}", e))?
                    .ok_or_else(|| format!("symlink without target: {}", path.display()))?;
                let parent = full_path.parent().unwrap_or(dest);
                ensure_symlink_target_within(dest, parent, &target)?;
            }
            tar::EntryType::Link => {
                // hard link targets are archive paths, so they get stripped too
                let target = entry
                    .link_name()
                    .map_err(|e| format!("tar link error: {}", e))?
                    .ok_or_else(|| format!("hard link without target: {}", path.display()))?
                    .into_owned();
                if is_unsafe(&target) {
                    return Err(format!("unsafe hard link target: {}", target.display()));
                }
                let source = strip_path(&target, strip)
                    .map(|t| dest.join(t))
                    .ok_or_else(|| format!("hard link target stripped away: {}", target.display()))?;
                std::fs::hard_link(&source, &full_path).map_err(|e| {
                    format!("cannot link {} -> {}: {}", full_path.display(), source.display(), e)
                })?;
                continue;
            }
            _ => {}
        }

        entry
            .unpack(&full_path)
            .map_err(|e| format!("unpack error for {}: {}", path.display(), e))?;
    }

    Ok(())
}

fn extract_zip<R: Read + std::io::Seek>(reader: R, dest: &Path, strip: usize) -> Result<(), String> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| format!("zip read error: {}", e))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| format!("zip entry error: {}", e))?;
        let Some(name) = file.enclosed_name() else {
            return Err(format!("unsafe path: {}", file.name()));
        };
        let Some(rel) = strip_path(&name, strip) else {
            continue;
        };
        let outpath = dest.join(&rel);
        ensure_no_symlink_components(dest, &rel)?;

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| format!("cannot create directory {}: {}", outpath.display(), e))?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
        }
        let mut outfile = File::create(&outpath)
            .map_err(|e| format!("cannot create {}: {}", outpath.display(), e))?;
        std::io::copy(&mut file, &mut outfile)
            .map_err(|e| format!("write error for {}: {}", outpath.display(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok(())
}
