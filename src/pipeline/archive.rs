//! ZIP bundle of every workbook in a batch.

use crate::output::OutputFile;
use chrono::{DateTime, Local};
use std::io::{Cursor, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// `excel_extractions_YYYYmmdd_HHMMSS.zip`
pub fn archive_name(at: DateTime<Local>) -> String {
    format!("excel_extractions_{}.zip", at.format("%Y%m%d_%H%M%S"))
}

/// Deflate `files` into an in-memory ZIP, one entry per file, in order.
pub fn create_zip(files: &[OutputFile]) -> ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        zip.start_file(file.name.as_str(), options)?;
        zip.write_all(&file.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}
