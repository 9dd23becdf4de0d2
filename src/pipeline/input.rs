//! Input handling: classify uploads and load CLI inputs into memory.
//!
//! Uploads arrive as `(file name, bytes)` pairs. The CLI accepts local paths
//! and HTTP/HTTPS URLs, which [`resolve_input`] turns into the same pair so
//! the rest of the pipeline never cares where a report came from.

use crate::error::{FileError, Xps2XlsxError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The two document formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Pdf,
    Xps,
}

impl InputKind {
    /// Classify by the last extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "xps" => Some(InputKind::Xps),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputKind::Pdf => "PDF",
            InputKind::Xps => "XPS",
        }
    }

    /// Leading bytes every well-formed file of this kind starts with.
    ///
    /// XPS is an OPC package, i.e. a zip archive.
    fn magic(self) -> &'static [u8] {
        match self {
            InputKind::Pdf => b"%PDF",
            InputKind::Xps => b"PK\x03\x04",
        }
    }
}

/// An input loaded into memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Classify an upload and check its content matches its extension.
pub fn classify(name: &str, bytes: &[u8]) -> Result<InputKind, FileError> {
    let kind = InputKind::from_file_name(name).ok_or_else(|| FileError::UnsupportedType {
        file: name.to_string(),
    })?;

    if !bytes.starts_with(kind.magic()) {
        return Err(FileError::InvalidContent {
            file: name.to_string(),
            expected: kind.label().to_string(),
        });
    }

    Ok(kind)
}

/// Reduce an uploaded file name to its final path component.
///
/// Browsers may send `C:\Users\lab\run.xps` or `../../run.xps`; only
/// `run.xps` is ever joined onto a scratch directory.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or("");
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    match cleaned.trim() {
        "" | "." | ".." => "upload".to_string(),
        s => s.to_string(),
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a CLI input (local path or URL) into memory.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<InputFile, Xps2XlsxError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<InputFile, Xps2XlsxError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Xps2XlsxError::PermissionDenied { path: path.clone() },
        _ => Xps2XlsxError::FileNotFound { path: path.clone() },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Read local input: {} ({} bytes)", path.display(), bytes.len());
    Ok(InputFile::new(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<InputFile, Xps2XlsxError> {
    info!("Downloading report from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Xps2XlsxError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Xps2XlsxError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Xps2XlsxError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Xps2XlsxError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Xps2XlsxError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(InputFile::new(file_name_from_url(url), bytes.to_vec()))
}

/// Take the last path segment of a URL when it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return sanitize_file_name(last);
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
