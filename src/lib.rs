//! # xps2xlsx
//!
//! Extract the tables of spectrophotometer reports (PDF or XPS) into Excel
//! workbooks, with Swedish decimal commas turned back into numbers.
//!
//! ## Why this crate?
//!
//! Lab instruments print their results tables as XPS or PDF. Getting them
//! into a spreadsheet by hand means retyping every concentration and fixing
//! `4,141` into `4.141`. This crate runs the reports through `xpstopdf` and
//! tabula-java, repairs the numbers, stitches tables that were split across
//! pages, and writes one workbook per report plus an optional combined
//! summary of `Sample`, `ng/ul` and `260/280`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (.pdf / .xps)
//!  │
//!  ├─ 1. Input     classify by extension, check magic bytes, stage in a TempDir
//!  ├─ 2. XPS       xpstopdf (external process, timeout + kill_on_drop)
//!  ├─ 3. Extract   tabula-java --lattice --format JSON
//!  ├─ 4. Merge     stitch page-split fragments (same columns / "Unnamed" header)
//!  ├─ 5. Numbers   "4,141" → 4.141, OCR-split "173,0.71" → 173.71
//!  ├─ 6. Summary   Source File / Sample / ng/ul / 260/280
//!  └─ 7. Output    one .xlsx per file, combined summary, ZIP when >1 file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xps2xlsx::{convert_paths, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_paths(&["run1.xps".to_string()], &config).await?;
//!     for r in &output.results {
//!         println!("{} | {} | {}", r.file, r.status, r.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `xps2xlsx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when embedding only the library or the router:
//! ```toml
//! xps2xlsx = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;
pub mod stream;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ExtractionMode, ServerConfig};
pub use convert::{
    convert_batch, convert_file, convert_paths, convert_paths_sync, convert_to_dir, write_outputs,
};
pub use error::{FileError, Xps2XlsxError};
pub use output::{BatchOutput, BatchStats, FileOutcome, FileResult, FileStatus, OutputFile};
pub use pipeline::input::{InputFile, InputKind};
pub use pipeline::tables::{TableExtractor, Tabula};
pub use pipeline::xps::{XpsConverter, XpsToPdf};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{create_router, serve, AppState};
pub use stream::{convert_stream, FileStream};
pub use table::{Cell, Table};
