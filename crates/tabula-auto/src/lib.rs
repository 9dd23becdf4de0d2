//! # tabula-auto
//!
//! Auto-download and cache the [tabula-java](https://github.com/tabulapdf/tabula-java)
//! command-line jar, so that users of `xps2xlsx` outside the container image
//! no longer need to fetch the jar by hand and point `TABULA_JAR` at it.
//!
//! ## How it works
//!
//! On first call to [`ensure_tabula_jar`]:
//!
//! 1. Honours `TABULA_JAR` when it points to an existing file.
//! 2. Checks `~/.cache/xps2xlsx/tabula-{VERSION}/` for the jar.
//! 3. If absent, downloads the `jar-with-dependencies` asset from the
//!    tabula-java GitHub release.
//! 4. Verifies the zip magic bytes and moves the file into the cache dir.
//!
//! Subsequent calls skip the network entirely — the jar is already cached.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tabula_auto::ensure_tabula_jar;
//!
//! let jar = ensure_tabula_jar(Some(&|downloaded, total| {
//!     if let Some(t) = total {
//!         eprint!("\rDownloading tabula: {}/{} bytes", downloaded, t);
//!     }
//! })).expect("download failed");
//! println!("java -jar {}", jar.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `TABULA_JAR` — path to an existing tabula jar; skips download.
//! - `TABULA_AUTO_CACHE_DIR` — override the default cache directory.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// The tabula-java release used for downloads.
pub const TABULA_VERSION: &str = "1.0.5";

/// GitHub release base URL.
const BASE_URL: &str = "https://github.com/tabulapdf/tabula-java/releases/download";

/// Every jar is a zip archive.
const JAR_MAGIC: &[u8; 4] = b"PK\x03\x04";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by tabula-auto operations.
#[derive(Error, Debug)]
pub enum TabulaAutoError {
    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// The downloaded payload is not a jar.
    #[error("Downloaded file is not a jar (first bytes: {magic:?})")]
    InvalidJar { magic: Vec<u8> },

    /// The jar could not be written into the cache.
    #[error("Failed to store jar at '{path}': {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File name of the release asset, e.g. `tabula-1.0.5-jar-with-dependencies.jar`.
pub fn jar_file_name() -> String {
    format!("tabula-{TABULA_VERSION}-jar-with-dependencies.jar")
}

/// Full download URL of the release asset.
pub fn download_url() -> String {
    format!("{BASE_URL}/v{TABULA_VERSION}/{}", jar_file_name())
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the per-version cache directory for the tabula jar.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/xps2xlsx/tabula-{VERSION}/`
/// - **Linux**: `~/.cache/xps2xlsx/tabula-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\xps2xlsx\tabula-{VERSION}\`
///
/// Override by setting `TABULA_AUTO_CACHE_DIR`.
pub fn tabula_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("TABULA_AUTO_CACHE_DIR") {
        return PathBuf::from(override_dir).join(format!("tabula-{TABULA_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("xps2xlsx").join(format!("tabula-{TABULA_VERSION}"))
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns `true` if the jar is already available locally (no network access
/// needed on the next call to [`ensure_tabula_jar`]).
pub fn is_tabula_cached() -> bool {
    cached_tabula_path().is_some()
}

/// Returns the on-disk path to the tabula jar, or `None` if not cached.
pub fn cached_tabula_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TABULA_JAR") {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Some(pb);
        }
    }
    let p = tabula_cache_dir().join(jar_file_name());
    p.exists().then_some(p)
}

/// Ensures the tabula jar is present locally and returns its path.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during
/// the download.  Pass `None` to suppress progress callbacks.
///
/// # Thread safety
///
/// Safe to call from multiple threads simultaneously; the resolved path is
/// memoised for the process lifetime.
pub fn ensure_tabula_jar(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, TabulaAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve_or_download(on_progress)?;
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

/// Validates `bytes` as a jar and writes it to `dest` atomically.
///
/// The payload goes to a sibling `*.part` file first and is renamed into
/// place, so a crash never leaves a truncated jar at `dest`.
pub fn store_jar(bytes: &[u8], dest: &Path) -> Result<(), TabulaAutoError> {
    if bytes.len() < JAR_MAGIC.len() || &bytes[..JAR_MAGIC.len()] != JAR_MAGIC {
        return Err(TabulaAutoError::InvalidJar {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }

    let part = dest.with_extension("jar.part");
    let store_err = |source| TabulaAutoError::Store {
        path: dest.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::create(&part).map_err(store_err)?;
    file.write_all(bytes).map_err(store_err)?;
    file.sync_all().map_err(store_err)?;
    drop(file);

    std::fs::rename(&part, dest).map_err(store_err)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve_or_download(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, TabulaAutoError> {
    // 1. Environment variable override.
    if let Ok(env_path) = std::env::var("TABULA_JAR") {
        let p = PathBuf::from(env_path);
        if p.exists() {
            return Ok(p);
        }
        eprintln!(
            "tabula-auto: TABULA_JAR '{}' not found; downloading …",
            p.display()
        );
    }

    let cache_dir = tabula_cache_dir();
    let jar_path = cache_dir.join(jar_file_name());

    // 2. Already cached on disk.
    if jar_path.exists() {
        return Ok(jar_path);
    }

    // 3. Download and store.
    std::fs::create_dir_all(&cache_dir).map_err(TabulaAutoError::CacheDir)?;

    let bytes = download_bytes(&download_url(), on_progress)?;
    store_jar(&bytes, &jar_path)?;

    Ok(jar_path)
}

/// Streams a URL into a `Vec<u8>`, calling `on_progress` every 64 KiB.
fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, TabulaAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("tabula-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| TabulaAutoError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| TabulaAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(TabulaAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let capacity = total.unwrap_or(16 * 1024 * 1024) as usize;
    let mut buf = Vec::with_capacity(capacity);

    let mut stream = response;
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(TabulaAutoError::Download(format!("Read error: {e}")));
            }
        }
    }

    Ok(buf)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_points_at_release_asset() {
        let url = download_url();
        assert!(url.starts_with(BASE_URL));
        assert!(url.contains(&format!("/v{TABULA_VERSION}/")));
        assert!(url.ends_with("-jar-with-dependencies.jar"));
    }

    #[test]
    fn cache_dir_is_versioned() {
        let d = tabula_cache_dir();
        assert!(d.ends_with(format!("tabula-{TABULA_VERSION}")));
    }

    #[test]
    fn cache_dir_override_via_env() {
        std::env::set_var("TABULA_AUTO_CACHE_DIR", "/tmp/test_xps2xlsx_override");
        let d = tabula_cache_dir();
        std::env::remove_var("TABULA_AUTO_CACHE_DIR");
        assert!(d.starts_with("/tmp/test_xps2xlsx_override"));
        assert!(d.to_str().unwrap().contains(TABULA_VERSION));
    }

    #[test]
    fn store_jar_rejects_non_zip_payload() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tabula.jar");
        let err = store_jar(b"<html>rate limited</html>", &dest).unwrap_err();
        assert!(matches!(err, TabulaAutoError::InvalidJar { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn store_jar_writes_and_leaves_no_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tabula.jar");
        store_jar(b"PK\x03\x04rest-of-archive", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"PK\x03\x04rest-of-archive");
        assert!(!dest.with_extension("jar.part").exists());
    }
}
