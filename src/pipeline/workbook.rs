//! Excel output via rust_xlsxwriter.
//!
//! Workbooks are built entirely in memory (`save_to_buffer`) because they
//! are served over HTTP or zipped before they ever touch a disk.

use crate::table::{Cell, Table};
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

/// Sheet names for `count` tables: `Sheet1` alone, else `Table_1`, `Table_2`, ….
pub fn sheet_names(count: usize) -> Vec<String> {
    if count == 1 {
        vec!["Sheet1".to_string()]
    } else {
        (1..=count).map(|i| format!("Table_{i}")).collect()
    }
}

/// Workbook name for an uploaded file: its stem plus `.xlsx`.
pub fn workbook_name(upload_name: &str) -> String {
    let stem = std::path::Path::new(upload_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| upload_name.to_string());
    format!("{stem}.xlsx")
}

/// `combined_summary_YYYYmmdd_HHMMSS.xlsx`
pub fn summary_workbook_name(at: DateTime<Local>) -> String {
    format!("combined_summary_{}.xlsx", at.format("%Y%m%d_%H%M%S"))
}

/// Write each table to its own sheet and return the `.xlsx` bytes.
pub fn tables_to_xlsx(tables: &[Table]) -> Result<Vec<u8>, XlsxError> {
    let names = sheet_names(tables.len());
    let header = header_format();
    let mut workbook = Workbook::new();

    for (table, name) in tables.iter().zip(&names) {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_table(sheet, table, &header)?;
    }

    workbook.save_to_buffer()
}

/// Write the combined summary to a single `Summary` sheet.
pub fn summary_to_xlsx(summary: &Table) -> Result<Vec<u8>, XlsxError> {
    let header = header_format();
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;
    write_table(sheet, summary, &header)?;

    workbook.save_to_buffer()
}

fn header_format() -> Format {
    Format::new().set_bold()
}

fn write_table(sheet: &mut Worksheet, table: &Table, header: &Format) -> Result<(), XlsxError> {
    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(n) => {
                    sheet.write_number(row_num, col, *n)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(row_num, col, s)?;
                }
            }
        }
    }

    Ok(())
}
