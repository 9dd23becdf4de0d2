//! XPS → PDF via the `xpstopdf` utility from libgxps-utils.
//!
//! tabula only reads PDF, so XPS uploads take a detour through
//! `xpstopdf <input.xps> <output.pdf>`. The PDF lands next to the XPS file
//! in the per-file scratch directory.

use crate::config::ConversionConfig;
use crate::error::FileError;
use crate::pipeline::process::{run_tool, ToolError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Anything that can turn an XPS file into a PDF file.
#[async_trait]
pub trait XpsConverter: Send + Sync {
    /// Write a PDF rendition of `xps` to `pdf`.
    async fn convert(&self, xps: &Path, pdf: &Path) -> Result<(), FileError>;
}

/// The default converter: runs the `xpstopdf` executable.
#[derive(Debug, Clone)]
pub struct XpsToPdf {
    pub program: PathBuf,
    pub timeout_secs: u64,
}

impl XpsToPdf {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            program: config.xpstopdf_bin.clone(),
            timeout_secs: config.tool_timeout_secs,
        }
    }
}

#[async_trait]
impl XpsConverter for XpsToPdf {
    async fn convert(&self, xps: &Path, pdf: &Path) -> Result<(), FileError> {
        let output = run_tool(&self.program, [xps.as_os_str(), pdf.as_os_str()], self.timeout_secs)
            .await
            .map_err(|e| match e {
                ToolError::NotFound { .. } => FileError::ToolNotFound {
                    tool: "xpstopdf".to_string(),
                    package: "libgxps-utils".to_string(),
                },
                ToolError::Timeout { secs, .. } => FileError::ToolTimeout {
                    tool: "xpstopdf".to_string(),
                    secs,
                },
                ToolError::Io { source, .. } => FileError::XpsConversionFailed {
                    stderr: source.to_string(),
                },
            })?;

        // xpstopdf has been seen to exit 0 without writing anything for
        // XPS packages that contain no fixed pages.
        if output.success() && tokio::fs::try_exists(pdf).await.unwrap_or(false) {
            debug!("xpstopdf wrote {}", pdf.display());
            Ok(())
        } else {
            Err(FileError::XpsConversionFailed {
                stderr: output.stderr,
            })
        }
    }
}

/// Pick the converter for a run: the configured override, else `xpstopdf`.
pub fn resolve_converter(config: &ConversionConfig) -> Arc<dyn XpsConverter> {
    match config.xps_converter {
        Some(ref c) => Arc::clone(c),
        None => Arc::new(XpsToPdf::from_config(config)),
    }
}

/// Where the PDF for a given XPS file goes: same stem, `.pdf` extension.
pub fn pdf_path_for(xps: &Path) -> PathBuf {
    xps.with_extension("pdf")
}

/// Convert `xps` and return the path of the produced PDF.
pub async fn xps_to_pdf(
    converter: &Arc<dyn XpsConverter>,
    xps: &Path,
) -> Result<PathBuf, FileError> {
    let pdf = pdf_path_for(xps);
    info!("Converting XPS to PDF: {}", xps.display());
    converter.convert(xps, &pdf).await?;
    Ok(pdf)
}
