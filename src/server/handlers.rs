//! Route handlers.

use super::error::ApiError;
use super::state::AppState;
use crate::convert::convert_batch;
use crate::output::{BatchOutput, BatchStats, FileResult, OutputFile, XLSX_MIME, ZIP_MIME};
use crate::pipeline::input::InputFile;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const INDEX_HTML: &str = include_str!("assets/index.html");

/// Multipart field that toggles the combined summary.
pub const INCLUDE_SUMMARY_FIELD: &str = "include_summary";

/// Body of a successful `POST /api/convert`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub job_id: String,
    pub results: Vec<FileResult>,
    /// Every workbook, summary included, in upload order.
    pub files: Vec<DownloadLink>,
    pub summary_file: Option<String>,
    pub archive: Option<DownloadLink>,
    pub success_count: usize,
    pub total_files: usize,
    pub stats: BatchStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadLink {
    pub name: String,
    pub size: usize,
    pub url: String,
}

impl ConvertResponse {
    fn new(job_id: String, output: &BatchOutput) -> Self {
        let files = output
            .files
            .iter()
            .map(|f| DownloadLink {
                name: f.name.clone(),
                size: f.size,
                url: format!("/api/jobs/{}/files/{}", job_id, urlencoding::encode(&f.name)),
            })
            .collect();
        let archive = output.archive.as_ref().map(|a| DownloadLink {
            name: a.name.clone(),
            size: a.size,
            url: format!("/api/jobs/{}/archive", job_id),
        });

        Self {
            success_count: output.success_count(),
            total_files: output.results.len(),
            results: output.results.clone(),
            summary_file: output.summary_file.clone(),
            stats: output.stats.clone(),
            files,
            archive,
            job_id,
        }
    }
}

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /_stcore/health`
pub async fn health() -> &'static str {
    "ok"
}

/// `POST /api/convert`
///
/// Accepts any number of file fields plus an optional `include_summary`
/// text field (`true`/`false`, `on`/`off`, `1`/`0`).
pub async fn convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut inputs = Vec::new();
    let mut include_summary = state.config.include_summary;

    while let Some(field) = multipart.next_field().await? {
        let file_name = field.file_name().map(str::to_string);
        match file_name {
            Some(name) if !name.is_empty() => {
                let bytes = field.bytes().await?;
                debug!("received {} ({} bytes)", name, bytes.len());
                inputs.push(InputFile::new(name, bytes.to_vec()));
            }
            Some(_) => {}
            None => {
                if field.name() == Some(INCLUDE_SUMMARY_FIELD) {
                    let value = field.text().await?;
                    include_summary = parse_flag(&value).ok_or_else(|| {
                        ApiError::BadRequest(format!(
                            "Invalid value for {INCLUDE_SUMMARY_FIELD}: '{value}'"
                        ))
                    })?;
                }
            }
        }
    }

    if inputs.is_empty() {
        return Err(ApiError::BadRequest(
            "Upload PDF or XPS files to get started".to_string(),
        ));
    }

    let mut config = state.config.clone();
    config.include_summary = include_summary;

    let total = inputs.len();
    let output = convert_batch(inputs, &config).await?;
    let success = output.success_count();
    let output = Arc::new(output);
    let job_id = state.jobs.insert(Arc::clone(&output)).await;
    info!(
        "job {}: successfully processed {}/{} files",
        job_id, success, total
    );

    Ok(Json(ConvertResponse::new(job_id, &output)))
}

/// `GET /api/jobs/:id/files/:name`
pub async fn download_file(
    State(state): State<AppState>,
    Path((job_id, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let output = find_job(&state, &job_id).await?;
    let file = output
        .file(&name)
        .ok_or_else(|| ApiError::NotFound(format!("No file '{name}' in job '{job_id}'")))?;
    Ok(attachment(file, XLSX_MIME))
}

/// `GET /api/jobs/:id/archive`
pub async fn download_archive(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let output = find_job(&state, &job_id).await?;
    let archive = output.archive.as_ref().ok_or_else(|| {
        ApiError::NotFound("Only one file available - use individual download above".to_string())
    })?;
    Ok(attachment(archive, ZIP_MIME))
}

async fn find_job(
    state: &AppState,
    job_id: &str,
) -> Result<Arc<BatchOutput>, ApiError> {
    state
        .jobs
        .get(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Unknown job '{job_id}'")))
}

fn attachment(file: &OutputFile, mime: &'static str) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.name.replace(['"', '\\'], "_")
    );
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes.clone(),
    )
        .into_response()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(parse_flag("on"), Some(true));
        assert_eq!(parse_flag(" False "), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn download_names_are_percent_encoded() {
        assert_eq!(urlencoding::encode("run 1.xlsx"), "run%201.xlsx");
        assert_eq!(urlencoding::encode("körning.xlsx"), "k%C3%B6rning.xlsx");
        assert_eq!(urlencoding::encode("plain_name-2.xlsx"), "plain_name-2.xlsx");
    }
}
