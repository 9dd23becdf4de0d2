//! Pipeline stages for XPS/PDF-to-Excel conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the two external tools can be swapped for
//! fakes without touching the stages around them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ xps ──▶ tables ──▶ merge ──▶ numbers ──▶ summary ──▶ workbook ──▶ archive
//! (upload)  (xpstopdf) (tabula)  (fragments) (1,5→1.5) (Sample…)  (.xlsx)     (.zip)
//! ```
//!
//! 1. [`input`]    — classify and validate an upload or a CLI path/URL
//! 2. [`xps`]      — shell out to `xpstopdf`; skipped for PDF uploads
//! 3. [`tables`]   — shell out to tabula-java and parse its JSON
//! 4. [`merge`]    — glue tables that tabula split across pages
//! 5. [`numbers`]  — turn comma-decimal text into numbers
//! 6. [`summary`]  — pick out Sample / ng/ul / 260/280 columns
//! 7. [`workbook`] — write worksheets via rust_xlsxwriter
//! 8. [`archive`]  — bundle all workbooks into one ZIP
//!
//! [`process`] is the shared helper both stages with subprocesses use.

pub mod archive;
pub mod input;
pub mod merge;
pub mod numbers;
pub mod process;
pub mod summary;
pub mod tables;
pub mod workbook;
pub mod xps;
