//! Error types for the xps2xlsx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Xps2XlsxError`] — **Fatal**: the batch cannot proceed at all
//!   (bad configuration, unreadable input path, output directory not
//!   writable). Returned as `Err(Xps2XlsxError)` from the top-level
//!   `convert*` functions.
//!
//! * [`FileError`] — **Non-fatal**: a single uploaded file failed (the XPS
//!   converter crashed, no tables were found) but every other file in the
//!   batch is fine. Stored inside [`crate::output::FileResult`] so callers
//!   can show partial success rather than losing the whole batch to one bad
//!   report.

use crate::output::FileStatus;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the xps2xlsx library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Xps2XlsxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The batch contained no files at all.
    #[error("No input files were given")]
    EmptyBatch,

    // ── Output errors ─────────────────────────────────────────────────────
    /// The ZIP bundle could not be assembled.
    #[error("Failed to build archive '{name}': {detail}")]
    ArchiveFailed { name: String, detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Server errors ─────────────────────────────────────────────────────
    /// The HTTP listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file of a batch.
///
/// The `Display` text is exactly what the results table shows in its
/// "message" column, so every variant reads as a complete sentence.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The extension is neither `.pdf` nor `.xps`.
    #[error("Unsupported file type for '{file}': only PDF and XPS files are accepted")]
    UnsupportedType { file: String },

    /// The extension is right but the bytes are not.
    #[error("'{file}' is not a valid {expected} file")]
    InvalidContent { file: String, expected: String },

    /// `xpstopdf` (or another configured tool) is not installed.
    #[error("{tool} command not found. Please install {package}")]
    ToolNotFound { tool: String, package: String },

    /// The XPS converter ran but did not produce a PDF.
    #[error("Failed to convert XPS to PDF{}", stderr_suffix(.stderr))]
    XpsConversionFailed { stderr: String },

    /// An external tool exceeded the configured timeout and was killed.
    #[error("{tool} timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    /// tabula-java failed or produced unreadable output.
    #[error("Error processing {file}: {detail}")]
    ExtractionFailed { file: String, detail: String },

    /// Extraction succeeded but found nothing.
    #[error("No tables found in {file}")]
    NoTables { file: String },

    /// The per-file workbook could not be written.
    #[error("Error processing {file}: {detail}")]
    WorkbookFailed { file: String, detail: String },

    /// Scratch-space I/O failed while staging the upload.
    #[error("Error processing {file}: {detail}")]
    Io { file: String, detail: String },
}

impl FileError {
    /// Map the error onto the status column of the results table.
    ///
    /// "Failed" means the pipeline ran and produced nothing; "Error" means
    /// the file never made it through the pipeline at all.
    pub fn status(&self) -> FileStatus {
        match self {
            FileError::UnsupportedType { .. }
            | FileError::InvalidContent { .. }
            | FileError::Io { .. } => FileStatus::Error,
            _ => FileStatus::Failed,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xps_failure_without_stderr_has_no_suffix() {
        let e = FileError::XpsConversionFailed {
            stderr: "  \n".into(),
        };
        assert_eq!(e.to_string(), "Failed to convert XPS to PDF");
    }

    #[test]
    fn xps_failure_with_stderr_appends_it() {
        let e = FileError::XpsConversionFailed {
            stderr: "Error opening file\n".into(),
        };
        assert_eq!(
            e.to_string(),
            "Failed to convert XPS to PDF: Error opening file"
        );
    }

    #[test]
    fn tool_not_found_names_package() {
        let e = FileError::ToolNotFound {
            tool: "xpstopdf".into(),
            package: "libgxps-utils".into(),
        };
        assert_eq!(
            e.to_string(),
            "xpstopdf command not found. Please install libgxps-utils"
        );
    }

    #[test]
    fn no_tables_is_failed_and_unsupported_is_error() {
        let none = FileError::NoTables {
            file: "run.pdf".into(),
        };
        assert_eq!(none.to_string(), "No tables found in run.pdf");
        assert_eq!(none.status(), FileStatus::Failed);

        let bad = FileError::UnsupportedType {
            file: "notes.txt".into(),
        };
        assert_eq!(bad.status(), FileStatus::Error);
    }

    #[test]
    fn output_write_failed_display() {
        let e = Xps2XlsxError::OutputWriteFailed {
            path: PathBuf::from("/out/a.xlsx"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/out/a.xlsx"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
    }
}
