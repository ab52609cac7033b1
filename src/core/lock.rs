//! Session lock
//!
//! Two provisioning runs sharing one scratch directory would clobber each
//! other's source trees, so a non-dry run holds an exclusive advisory lock on
//! `<temp>/.toolchain-install.lock` until it exits.

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Lock file name inside the scratch directory
pub const LOCK_FILE_NAME: &str = ".toolchain-install.lock";

/// A lock file untouched for this long is left over from a crashed run
const STALE_AFTER: Duration = Duration::from_secs(2 * 60 * 60);

fn lock_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

/// Whether a running session holds the lock on `path`.
///
/// A long build never touches the file, so age alone cannot tell a crashed
/// run from a live one.
fn is_held(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            false
        }
        Err(_) => true,
    }
}

/// Take the session lock for `temp_dir`, creating the directory if needed.
///
/// Fails immediately if another run holds it. The returned guard releases
/// the lock and removes the file when dropped.
pub fn acquire_session_lock(temp_dir: &Path) -> Result<SessionLock> {
    std::fs::create_dir_all(temp_dir)
        .with_context(|| format!("cannot create scratch directory {}", temp_dir.display()))?;

    let path = temp_dir.join(LOCK_FILE_NAME);
    if lock_age(&path).is_some_and(|age| age > STALE_AFTER) && !is_held(&path) {
        let _ = std::fs::remove_file(&path);
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .with_context(|| format!("cannot create lock file {}", path.display()))?;
    if FileExt::try_lock_exclusive(&file).is_err() {
        bail!(
            "another install session is already using {} (remove {} if no other run is active)",
            temp_dir.display(),
            path.display()
        );
    }

    Ok(SessionLock { _file: file, path })
}

/// Held for the duration of a non-dry run
#[derive(Debug)]
pub struct SessionLock {
    _file: File,
    path: PathBuf,
}

impl SessionLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
