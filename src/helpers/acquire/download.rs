//! HTTP(S) downloads with an optional on-disk cache
//!
//! With a cache directory the archive lands in `<cache>/<basename>` and is
//! reused by later runs. Without one it goes to a temporary file that is
//! deleted once the caller drops the [`Downloaded`] handle.

use crate::core::error::FetchError;
use crate::core::output::{self, ProgressGuard};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Default HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Get HTTP timeout from `TOOLCHAIN_HTTP_TIMEOUT` or use the default.
/// Read once per process.
fn http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var("TOOLCHAIN_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        Duration::from_secs(secs.clamp(5, 300))
    })
}

/// A downloaded archive on disk
#[derive(Debug)]
pub enum Downloaded {
    /// Kept in the download cache
    Cached(PathBuf),
    /// Deleted when dropped
    Temporary(NamedTempFile),
}

impl Downloaded {
    pub fn path(&self) -> &Path {
        match self {
            Downloaded::Cached(path) => path,
            Downloaded::Temporary(file) => file.path(),
        }
    }
}

/// Last path segment of `url`, without query or fragment
pub fn url_basename(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let name = url[..end].trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if name.is_empty() || name.contains(':') {
        "download"
    } else {
        name
    }
}

/// Fetch `url`, reusing `<cache_dir>/<basename>` when it already exists.
pub fn fetch(url: &str, cache_dir: Option<&Path>) -> Result<Downloaded, FetchError> {
    let name = url_basename(url);

    let Some(cache_dir) = cache_dir else {
        let mut file = tempfile::Builder::new()
            .prefix("toolchain-")
            .suffix(&format!("-{}", name))
            .tempfile()
            .map_err(|e| io_error("cannot create temporary file", e))?;
        download_to(url, file.as_file_mut(), name)?;
        return Ok(Downloaded::Temporary(file));
    };

    let cached = cache_dir.join(name);
    if cached.is_file() {
        output::detail(&format!("using cached {}", cached.display()));
        return Ok(Downloaded::Cached(cached));
    }

    std::fs::create_dir_all(cache_dir)
        .map_err(|e| io_error(&format!("cannot create {}", cache_dir.display()), e))?;

    let partial = cache_dir.join(format!("{}.part", name));
    let result = File::create(&partial)
        .map_err(|e| io_error(&format!("cannot create {}", partial.display()), e))
        .and_then(|mut file| download_to(url, &mut file, name))
        .and_then(|_| {
            std::fs::rename(&partial, &cached)
                .map_err(|e| io_error(&format!("cannot move {}", partial.display()), e))
        });

    if let Err(e) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    Ok(Downloaded::Cached(cached))
}

/// Stream `url` into `file` with a progress bar. Returns the byte count.
fn download_to(url: &str, file: &mut File, name: &str) -> Result<u64, FetchError> {
    let failed = |reason: String| FetchError::Download {
        url: url.to_string(),
        reason,
    };

    output::detail(&format!("downloading {}", url));
    let response = ureq::get(url)
        .timeout(http_timeout())
        .call()
        .map_err(|e| failed(e.to_string()))?;

    let pb = match response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        Some(len) => output::download_progress(len),
        None => output::spinner(&format!("downloading {}", name)),
    };
    let guard = ProgressGuard(pb);

    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| failed(format!("read error: {}", e)))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])
            .map_err(|e| failed(format!("write error: {}", e)))?;
        total_bytes += bytes_read as u64;
        guard.bar().set_position(total_bytes);
    }
    file.flush().map_err(|e| failed(format!("write error: {}", e)))?;

    drop(guard);
    output::detail(&format!("downloaded {} ({} bytes)", name, total_bytes));
    Ok(total_bytes)
}

fn io_error(context: &str, source: std::io::Error) -> FetchError {
    FetchError::Io {
        context: context.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_basename() {
        assert_eq!(
            url_basename("https://ftp.gnu.org/gnu/gcc/gcc-5.3.0/gcc-5.3.0.tar.bz2"),
            "gcc-5.3.0.tar.bz2"
        );
        assert_eq!(url_basename("https://example.com/a.tar.gz?x=1#frag"), "a.tar.gz");
        assert_eq!(url_basename("https://example.com/dir/"), "dir");
        assert_eq!(url_basename("https://"), "download");
    }

    #[tokio::test]
    async fn test_fetch_into_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gmp-6.0.0a.tar.bz2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let cache = TempDir::new().unwrap();
        let url = format!("{}/gmp-6.0.0a.tar.bz2", server.uri());

        let first = fetch(&url, Some(cache.path())).unwrap();
        assert_eq!(first.path(), cache.path().join("gmp-6.0.0a.tar.bz2"));
        assert_eq!(std::fs::read(first.path()).unwrap(), b"archive");

        // second fetch is served from the cache; the mock expects one hit
        let second = fetch(&url, Some(cache.path())).unwrap();
        assert!(matches!(second, Downloaded::Cached(_)));
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_no_partial_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = TempDir::new().unwrap();
        let url = format!("{}/missing.tar.gz", server.uri());

        let err = fetch(&url, Some(cache.path())).unwrap_err();
        assert!(matches!(err, FetchError::Download { .. }));
        assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_without_cache_uses_temporary_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mpc-1.0.3.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
            .mount(&server)
            .await;

        let url = format!("{}/mpc-1.0.3.tar.gz", server.uri());
        let downloaded = fetch(&url, None).unwrap();
        let tmp_path = downloaded.path().to_path_buf();

        assert!(tmp_path.to_string_lossy().ends_with("mpc-1.0.3.tar.gz"));
        assert_eq!(std::fs::read(&tmp_path).unwrap(), b"data");

        drop(downloaded);
        assert!(!tmp_path.exists());
    }
}
