//! Fake external tools shared by the integration tests.
//!
//! Neither `xpstopdf` nor a JVM is needed: the fakes stand in for both and
//! decide what to return from the PDF's file stem.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use xps2xlsx::{Cell, ConversionConfig, FileError, Table, TableExtractor, XpsConverter};

pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n%fake report\n";
pub const XPS_BYTES: &[u8] = b"PK\x03\x04fake xps package";

/// Returns canned tables keyed by PDF file stem; unknown stems yield none.
#[derive(Default)]
pub struct FakeExtractor {
    pub tables: HashMap<String, Vec<Table>>,
}

impl FakeExtractor {
    pub fn with(mut self, stem: &str, tables: Vec<Table>) -> Self {
        self.tables.insert(stem.to_string(), tables);
        self
    }
}

#[async_trait]
impl TableExtractor for FakeExtractor {
    async fn extract(&self, pdf: &Path) -> Result<Vec<Table>, FileError> {
        assert!(pdf.exists(), "extractor called on missing {}", pdf.display());
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.tables.get(&stem).cloned().unwrap_or_default())
    }
}

/// Writes a stub PDF next to the XPS, or fails for stems listed in `fail`.
#[derive(Default)]
pub struct FakeXps {
    pub fail: Vec<String>,
}

#[async_trait]
impl XpsConverter for FakeXps {
    async fn convert(&self, xps: &Path, pdf: &Path) -> Result<(), FileError> {
        let stem = xps
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail.contains(&stem) {
            return Err(FileError::XpsConversionFailed {
                stderr: "Error opening file\n".to_string(),
            });
        }
        tokio::fs::write(pdf, PDF_BYTES)
            .await
            .map_err(|e| FileError::Io {
                file: xps.display().to_string(),
                detail: e.to_string(),
            })
    }
}

/// A spectrophotometer results table with Swedish decimals.
pub fn nanodrop_table(samples: &[(&str, &str, &str)]) -> Table {
    Table::new(
        vec![
            "#".to_string(),
            "Sample Name".to_string(),
            "ng/uL".to_string(),
            "260/280".to_string(),
        ],
        samples
            .iter()
            .enumerate()
            .map(|(i, (name, conc, ratio))| {
                vec![
                    Cell::Number((i + 1) as f64),
                    Cell::from(*name),
                    Cell::from(*conc),
                    Cell::from(*ratio),
                ]
            })
            .collect(),
    )
}

/// A table none of whose columns belong in the summary.
pub fn instrument_table() -> Table {
    Table::new(
        vec!["Instrument".to_string(), "Serial".to_string()],
        vec![vec![Cell::from("ND-1000"), Cell::from("A123")]],
    )
}

/// Route library logs to the test harness; `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn config(extractor: FakeExtractor, xps: FakeXps) -> ConversionConfig {
    ConversionConfig::builder()
        .extractor(Arc::new(extractor))
        .xps_converter(Arc::new(xps))
        .concurrency(2)
        .build()
        .unwrap()
}
