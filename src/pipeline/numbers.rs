//! Swedish number format: comma as the decimal separator.
//!
//! Instruments configured for a Swedish (or German) locale print `4,141`
//! where Excel expects `4.141`. tabula hands these over as text, so every
//! text cell that *starts* like a decimal number is rewritten here.
//!
//! ## Rules
//!
//! Only values whose prefix matches `\d+[,.]\d+` are considered:
//!
//! | Separators            | Action                                          |
//! |-----------------------|-------------------------------------------------|
//! | one `,`, no `.`       | `,` → `.` and parse (`4,141` → 4.141)           |
//! | one `,` and one `.`   | OCR repair, see [`repair_ocr_split`]            |
//! | anything else         | unchanged                                       |
//!
//! A value that still does not parse (`12,5 kg`) is left as text.

use crate::table::{Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DECIMAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[,.]\d+").unwrap());

/// Convert one value; `None` means "leave the text as it is".
pub fn convert_swedish_number(value: &str) -> Option<f64> {
    if !RE_DECIMAL_PREFIX.is_match(value) {
        return None;
    }

    let commas = value.matches(',').count();
    let dots = value.matches('.').count();

    match (commas, dots) {
        (1, 0) => parse(&value.replace(',', ".")),
        (1, 1) => parse(&repair_ocr_split(value)),
        _ => None,
    }
}

/// OCR sometimes reads `173.071` as `173,0.71`. Dotting the comma gives
/// three parts; when the middle one is a single character it is dropped.
///
/// `173,0.71` → `173.0.71` → `173.71`
pub fn repair_ocr_split(value: &str) -> String {
    let dotted = value.replace(',', ".");
    let parts: Vec<&str> = dotted.split('.').collect();
    if parts.len() == 3 && parts[1].chars().count() == 1 {
        format!("{}.{}", parts[0], parts[2])
    } else {
        dotted
    }
}

fn parse(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Rewrite every text cell of `table` that holds a comma-decimal number.
pub fn fix_swedish_numbers(table: &mut Table) {
    for cell in table.cells_mut() {
        let converted = cell.as_text().and_then(convert_swedish_number);
        if let Some(n) = converted {
            *cell = Cell::Number(n);
        }
    }
}
