//! Batch conversion entry points.
//!
//! A batch is what one click on "Process Files" submits: any number of PDF
//! and XPS reports. Every file gets its own scratch directory and its own
//! row in the results table; a file that fails never aborts the batch.
//! Use [`crate::stream::convert_stream`] instead when rows should be shown
//! as they finish.

use crate::config::ConversionConfig;
use crate::error::{FileError, Xps2XlsxError};
use crate::output::{BatchOutput, BatchStats, FileOutcome, FileResult, FileStatus, OutputFile};
use crate::pipeline::input::{self, InputFile, InputKind};
use crate::pipeline::tables::{self, TableExtractor};
use crate::pipeline::xps::{self, XpsConverter};
use crate::pipeline::{archive, merge, numbers, summary, workbook};
use crate::table::Table;
use chrono::Local;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// The two external tools, resolved once per batch.
#[derive(Clone)]
pub(crate) struct Toolchain {
    pub xps: Arc<dyn XpsConverter>,
    pub extractor: Arc<dyn TableExtractor>,
}

impl Toolchain {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            xps: xps::resolve_converter(config),
            extractor: tables::resolve_extractor(config),
        }
    }
}

/// Convert a batch of in-memory files.
///
/// # Returns
/// `Ok(BatchOutput)` whenever the batch could be attempted, even if every
/// file failed; inspect `output.results` for the per-file outcome.
///
/// # Errors
/// - [`Xps2XlsxError::EmptyBatch`] for an empty input list
/// - [`Xps2XlsxError::ArchiveFailed`] when the ZIP bundle cannot be built
pub async fn convert_batch(
    inputs: Vec<InputFile>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Xps2XlsxError> {
    if inputs.is_empty() {
        return Err(Xps2XlsxError::EmptyBatch);
    }

    let start = Instant::now();
    let total = inputs.len();
    let tools = Toolchain::from_config(config);
    info!("Starting batch of {} file(s)", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // `buffered` keeps upload order while running up to `concurrency` files.
    let outcomes: Vec<FileOutcome> = stream::iter(inputs.into_iter().enumerate().map(|(i, file)| {
        let tools = tools.clone();
        async move { convert_one(i + 1, total, file, &tools, config).await }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await;

    let output = assemble_batch(outcomes, config, start).await?;

    info!(
        "Batch complete: {}/{} file(s) succeeded in {}ms",
        output.stats.success_files, total, output.stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, output.stats.success_files);
    }

    Ok(output)
}

/// Convert files given as local paths or HTTP/HTTPS URLs.
///
/// Unlike per-file conversion errors, an input that cannot be read at all
/// is fatal: the caller named it explicitly.
pub async fn convert_paths(
    inputs: &[String],
    config: &ConversionConfig,
) -> Result<BatchOutput, Xps2XlsxError> {
    let mut files = Vec::with_capacity(inputs.len());
    for raw in inputs {
        files.push(input::resolve_input(raw, config.download_timeout_secs).await?);
    }
    convert_batch(files, config).await
}

/// Convert a single file on its own.
///
/// Never fails: a conversion problem is reported through
/// `outcome.result.status` and `outcome.result.message`.
pub async fn convert_file(file: InputFile, config: &ConversionConfig) -> FileOutcome {
    let tools = Toolchain::from_config(config);
    convert_one(1, 1, file, &tools, config).await
}

/// Convert inputs and write every workbook into `dir`.
pub async fn convert_to_dir(
    inputs: &[String],
    dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Xps2XlsxError> {
    let output = convert_paths(inputs, config).await?;
    write_outputs(&output, dir, false).await?;
    Ok(output)
}

/// Synchronous wrapper around [`convert_paths`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_paths_sync(
    inputs: &[String],
    config: &ConversionConfig,
) -> Result<BatchOutput, Xps2XlsxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Xps2XlsxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_paths(inputs, config))
}

/// Write the workbooks of `output` (and optionally its ZIP) into `dir`.
///
/// Uses atomic writes (temp file + rename) so a reader never sees a
/// half-written workbook.
pub async fn write_outputs(
    output: &BatchOutput,
    dir: impl AsRef<Path>,
    include_archive: bool,
) -> Result<Vec<std::path::PathBuf>, Xps2XlsxError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Xps2XlsxError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let archive = output.archive.iter().filter(|_| include_archive);
    let mut written = Vec::new();

    for file in output.files.iter().chain(archive) {
        let path = dir.join(&file.name);
        write_atomic(&path, &file.bytes).await?;
        written.push(path);
    }

    Ok(written)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Xps2XlsxError> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| Xps2XlsxError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Xps2XlsxError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

// ── Per-file pipeline ────────────────────────────────────────────────────

/// Run one file through the pipeline and fire its progress events.
pub(crate) async fn convert_one(
    index: usize,
    total: usize,
    file: InputFile,
    tools: &Toolchain,
    config: &ConversionConfig,
) -> FileOutcome {
    let start = Instant::now();
    let name = input::sanitize_file_name(&file.name);

    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(index, total, &name);
    }

    let outcome = match run_pipeline(&name, &file.bytes, tools).await {
        Ok(done) => {
            let summary_rows = done.summary.as_ref().map_or(0, Table::height);
            FileOutcome {
                result: FileResult {
                    index,
                    file: name.clone(),
                    status: FileStatus::Success,
                    message: done.message,
                    excel_file: Some(done.workbook.name.clone()),
                    table_count: done.table_count,
                    summary_rows,
                    duration_ms: start.elapsed().as_millis() as u64,
                },
                workbook: Some(done.workbook),
                summary: done.summary,
            }
        }
        Err(failure) => {
            warn!("{}: {}", name, failure.message);
            FileOutcome {
                result: FileResult {
                    index,
                    file: name.clone(),
                    status: failure.status,
                    message: failure.message,
                    excel_file: None,
                    table_count: 0,
                    summary_rows: 0,
                    duration_ms: start.elapsed().as_millis() as u64,
                },
                workbook: None,
                summary: None,
            }
        }
    };

    if let Some(ref cb) = config.progress_callback {
        let r = &outcome.result;
        if r.is_success() {
            cb.on_file_complete(index, total, &r.file, r.table_count);
        } else {
            cb.on_file_error(index, total, &r.file, &r.message);
        }
    }

    outcome
}

struct Converted {
    workbook: OutputFile,
    summary: Option<Table>,
    table_count: usize,
    message: String,
}

struct Failure {
    status: FileStatus,
    message: String,
}

impl Failure {
    fn from_error(err: FileError, prefix: Option<&str>) -> Self {
        let message = match prefix {
            Some(p) => format!("{p}{err}"),
            None => err.to_string(),
        };
        Self {
            status: err.status(),
            message,
        }
    }
}

/// Label prepended to every PDF-stage message of an XPS upload.
const XPS_CHAIN_PREFIX: &str = "XPS→PDF→Excel: ";

async fn run_pipeline(
    name: &str,
    bytes: &[u8],
    tools: &Toolchain,
) -> Result<Converted, Failure> {
    let kind = input::classify(name, bytes).map_err(|e| Failure::from_error(e, None))?;

    let scratch = TempDir::new().map_err(|e| io_failure(name, e))?;
    let staged = scratch.path().join(name);
    tokio::fs::write(&staged, bytes)
        .await
        .map_err(|e| io_failure(name, e))?;
    debug!("staged {} ({} bytes)", staged.display(), bytes.len());

    let (pdf_path, prefix) = match kind {
        InputKind::Pdf => (staged, None),
        InputKind::Xps => {
            let pdf = xps::xps_to_pdf(&tools.xps, &staged)
                .await
                .map_err(|e| Failure::from_error(e, None))?;
            (pdf, Some(XPS_CHAIN_PREFIX))
        }
    };

    let converted = pdf_to_workbook(name, &pdf_path, tools)
        .await
        .map_err(|e| Failure::from_error(e, prefix))?;

    Ok(Converted {
        message: format!("{}{}", prefix.unwrap_or(""), converted.message),
        ..converted
    })
    // `scratch` is dropped here, removing the staged upload and the PDF.
}

fn io_failure(name: &str, e: std::io::Error) -> Failure {
    Failure::from_error(
        FileError::Io {
            file: name.to_string(),
            detail: e.to_string(),
        },
        None,
    )
}

/// Extract, merge, normalise and write one PDF.
async fn pdf_to_workbook(
    upload_name: &str,
    pdf: &Path,
    tools: &Toolchain,
) -> Result<Converted, FileError> {
    let pdf_name = pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| upload_name.to_string());
    let source = pdf
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf_name.clone());

    let raw = tools.extractor.extract(pdf).await?;
    if raw.is_empty() {
        return Err(FileError::NoTables { file: pdf_name });
    }

    // A lone table is written as-is, even when it only has a header row.
    let fragmented = raw.len() > 1;
    let mut merged = merge::merge_fragmented_tables(raw);
    if fragmented {
        merged.retain(|t| !t.is_empty());
    }
    if merged.is_empty() {
        return Err(FileError::NoTables { file: pdf_name });
    }

    let mut summaries = Vec::new();
    for table in &mut merged {
        numbers::fix_swedish_numbers(table);
        if let Some(s) = summary::extract_summary_data(table, &source) {
            summaries.push(s);
        }
    }

    let table_count = merged.len();
    let bytes = tokio::task::spawn_blocking(move || workbook::tables_to_xlsx(&merged))
        .await
        .map_err(|e| FileError::WorkbookFailed {
            file: pdf_name.clone(),
            detail: format!("workbook task panicked: {e}"),
        })?
        .map_err(|e| FileError::WorkbookFailed {
            file: pdf_name.clone(),
            detail: e.to_string(),
        })?;

    Ok(Converted {
        workbook: OutputFile::new(workbook::workbook_name(upload_name), bytes),
        summary: summary::combine(summaries),
        table_count,
        message: format!("Successfully processed {table_count} table(s)"),
    })
}

// ── Batch assembly ───────────────────────────────────────────────────────

/// Collect per-file outcomes into workbooks, summary, archive and stats.
pub(crate) async fn assemble_batch(
    outcomes: Vec<FileOutcome>,
    config: &ConversionConfig,
    start: Instant,
) -> Result<BatchOutput, Xps2XlsxError> {
    let mut results = Vec::with_capacity(outcomes.len());
    let mut files: Vec<OutputFile> = Vec::new();
    let mut summaries = Vec::new();

    for outcome in outcomes {
        if let Some(wb) = outcome.workbook {
            push_replacing(&mut files, wb);
        }
        if let Some(s) = outcome.summary {
            summaries.push(s);
        }
        results.push(outcome.result);
    }

    let mut summary_file = None;
    let mut summary_rows = 0;
    if config.include_summary {
        if let Some(combined) = summary::combine(summaries) {
            summary_rows = combined.height();
            let name = workbook::summary_workbook_name(Local::now());
            match tokio::task::spawn_blocking(move || workbook::summary_to_xlsx(&combined)).await {
                Ok(Ok(bytes)) => {
                    info!("Created combined summary with {} rows", summary_rows);
                    push_replacing(&mut files, OutputFile::new(name.clone(), bytes));
                    summary_file = Some(name);
                }
                Ok(Err(e)) => warn!("Error creating combined summary: {}", e),
                Err(e) => warn!("Error creating combined summary: {}", e),
            }
        }
    }

    let archive = if files.len() > 1 {
        let name = archive::archive_name(Local::now());
        let bundle = files.clone();
        let bytes = tokio::task::spawn_blocking(move || archive::create_zip(&bundle))
            .await
            .map_err(|e| Xps2XlsxError::Internal(format!("Archive task panicked: {e}")))?
            .map_err(|e| Xps2XlsxError::ArchiveFailed {
                name: name.clone(),
                detail: e.to_string(),
            })?;
        Some(OutputFile::new(name, bytes))
    } else {
        None
    };

    let count = |status: FileStatus| results.iter().filter(|r| r.status == status).count();
    let stats = BatchStats {
        total_files: results.len(),
        success_files: count(FileStatus::Success),
        failed_files: count(FileStatus::Failed),
        error_files: count(FileStatus::Error),
        total_tables: results.iter().map(|r| r.table_count).sum(),
        summary_rows: if summary_file.is_some() { summary_rows } else { 0 },
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    Ok(BatchOutput {
        results,
        files,
        summary_file,
        archive,
        stats,
    })
}

/// Add `file`, replacing an earlier file with the same name in place.
fn push_replacing(files: &mut Vec<OutputFile>, file: OutputFile) {
    match files.iter_mut().find(|f| f.name == file.name) {
        Some(existing) => {
            debug!("replacing earlier output {}", file.name);
            *existing = file;
        }
        None => files.push(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_replacing_keeps_position() {
        let mut files = vec![
            OutputFile::new("a.xlsx", vec![1]),
            OutputFile::new("b.xlsx", vec![2]),
        ];
        push_replacing(&mut files, OutputFile::new("a.xlsx", vec![9, 9]));
        push_replacing(&mut files, OutputFile::new("c.xlsx", vec![3]));

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.xlsx", "b.xlsx", "c.xlsx"]);
        assert_eq!(files[0].bytes, vec![9, 9]);
        assert_eq!(files[0].size, 2);
    }

    #[test]
    fn failure_prefix_only_when_given() {
        let e = FileError::NoTables {
            file: "run.pdf".into(),
        };
        let f = Failure::from_error(e.clone(), Some(XPS_CHAIN_PREFIX));
        assert_eq!(f.message, "XPS→PDF→Excel: No tables found in run.pdf");
        assert_eq!(f.status, FileStatus::Failed);

        let f = Failure::from_error(e, None);
        assert_eq!(f.message, "No tables found in run.pdf");
    }

    #[tokio::test]
    async fn empty_batch_is_fatal() {
        let err = convert_batch(Vec::new(), &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Xps2XlsxError::EmptyBatch));
    }
}
