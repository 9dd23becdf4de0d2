//! Result types produced by a conversion.

use crate::table::Table;
use serde::{Deserialize, Serialize};

/// MIME type of every workbook we produce.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME type of the batch archive.
pub const ZIP_MIME: &str = "application/zip";

/// Outcome of one file, as shown in the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// A workbook was produced.
    Success,
    /// The pipeline ran but produced no workbook (no tables, converter failure).
    Failed,
    /// The file never made it through the pipeline (wrong type, corrupt upload).
    Error,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Success => "Success",
            FileStatus::Failed => "Failed",
            FileStatus::Error => "Error",
        };
        f.write_str(s)
    }
}

/// One row of the results table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// 1-based position in the upload order.
    pub index: usize,
    /// Name of the uploaded file.
    pub file: String,
    pub status: FileStatus,
    /// Human-readable outcome, e.g. `XPS→PDF→Excel: Successfully processed 2 table(s)`.
    pub message: String,
    /// Name of the produced workbook, when there is one.
    pub excel_file: Option<String>,
    /// Number of tables after fragment merging.
    pub table_count: usize,
    /// Rows this file contributed to the combined summary.
    pub summary_rows: usize,
    pub duration_ms: u64,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// A named blob ready for download or for writing to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFile {
    pub name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size: usize,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len();
        Self {
            name: name.into(),
            bytes,
            size,
        }
    }
}

/// Everything one file produced: the results row plus its artefacts.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub result: FileResult,
    pub workbook: Option<OutputFile>,
    pub summary: Option<Table>,
}

/// Aggregate numbers for a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub success_files: usize,
    pub failed_files: usize,
    pub error_files: usize,
    pub total_tables: usize,
    pub summary_rows: usize,
    pub total_duration_ms: u64,
}

/// The complete output of [`crate::convert::convert_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    /// One entry per uploaded file, in upload order.
    pub results: Vec<FileResult>,
    /// Per-file workbooks followed by the combined summary, if any.
    pub files: Vec<OutputFile>,
    /// Name of the combined summary workbook inside `files`.
    pub summary_file: Option<String>,
    /// ZIP of all `files`; only built when there is more than one.
    pub archive: Option<OutputFile>,
    pub stats: BatchStats,
}

impl BatchOutput {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn file(&self, name: &str) -> Option<&OutputFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_results_table() {
        assert_eq!(FileStatus::Success.to_string(), "Success");
        assert_eq!(FileStatus::Failed.to_string(), "Failed");
        assert_eq!(FileStatus::Error.to_string(), "Error");
    }

    #[test]
    fn output_file_serialises_without_bytes() {
        let f = OutputFile::new("a.xlsx", vec![1, 2, 3]);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["name"], "a.xlsx");
        assert_eq!(json["size"], 3);
        assert!(json.get("bytes").is_none());
    }
}
