//! Table extraction: PDF → [`Table`]s via tabula-java.
//!
//! tabula runs in its own JVM and prints every detected table as JSON:
//!
//! ```text
//! [ { "extraction_method": "lattice", "page_number": 1, ...,
//!     "data": [ [ {"text": "Sample", ...}, {"text": "ng/ul", ...} ],
//!               [ {"text": "S1", ...},     {"text": "4,141", ...} ] ] } ]
//! ```
//!
//! The first row of each table is its header. Headers are made unique and
//! non-blank so later stages can address columns by name; a blank header
//! cell becomes `Unnamed: <position>`, which is exactly what the fragment
//! merger keys on.

use crate::config::{ConversionConfig, ExtractionMode};
use crate::error::FileError;
use crate::pipeline::process::{run_tool, ToolError};
use crate::table::{Cell, Table};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Anything that can find tables in a PDF.
#[async_trait]
pub trait TableExtractor: Send + Sync {
    /// Return every table of `pdf`, in page order.
    async fn extract(&self, pdf: &Path) -> Result<Vec<Table>, FileError>;
}

/// The default extractor: `java -jar tabula.jar … --format JSON`.
#[derive(Debug, Clone)]
pub struct Tabula {
    pub java: PathBuf,
    pub jar: PathBuf,
    pub mode: ExtractionMode,
    pub guess: bool,
    pub timeout_secs: u64,
}

impl Tabula {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            java: config.java_bin.clone(),
            jar: config.tabula_jar.clone(),
            mode: config.extraction_mode,
            guess: config.guess_areas,
            timeout_secs: config.tool_timeout_secs,
        }
    }

    /// Command-line arguments for one extraction run.
    pub fn args(&self, pdf: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-Dfile.encoding=UTF8".into(),
            "-Djava.awt.headless=true".into(),
            "-jar".into(),
            self.jar.clone().into_os_string(),
            "--pages".into(),
            "all".into(),
            self.mode.flag().into(),
        ];
        if self.guess {
            args.push("--guess".into());
        }
        args.extend(["--silent".into(), "--format".into(), "JSON".into()]);
        args.push(pdf.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl TableExtractor for Tabula {
    async fn extract(&self, pdf: &Path) -> Result<Vec<Table>, FileError> {
        let file = display_name(pdf);

        if !tokio::fs::try_exists(&self.jar).await.unwrap_or(false) {
            return Err(FileError::ExtractionFailed {
                file,
                detail: format!("tabula jar not found at {}", self.jar.display()),
            });
        }

        info!("Extracting tables from {}", pdf.display());
        let output = run_tool(&self.java, self.args(pdf), self.timeout_secs)
            .await
            .map_err(|e| match e {
                ToolError::NotFound { .. } => FileError::ToolNotFound {
                    tool: "java".to_string(),
                    package: "a Java runtime".to_string(),
                },
                ToolError::Timeout { secs, .. } => FileError::ToolTimeout {
                    tool: "tabula".to_string(),
                    secs,
                },
                ToolError::Io { source, .. } => FileError::ExtractionFailed {
                    file: file.clone(),
                    detail: source.to_string(),
                },
            })?;

        if !output.success() {
            let stderr = output.stderr.trim();
            return Err(FileError::ExtractionFailed {
                file,
                detail: if stderr.is_empty() {
                    format!("tabula exited with {}", output.status)
                } else {
                    stderr.to_string()
                },
            });
        }

        parse_tabula_json(&output.stdout).map_err(|e| FileError::ExtractionFailed {
            file,
            detail: format!("unreadable tabula output: {e}"),
        })
    }
}

/// Pick the extractor for a run: the configured override, else tabula.
pub fn resolve_extractor(config: &ConversionConfig) -> Arc<dyn TableExtractor> {
    match config.extractor {
        Some(ref e) => Arc::clone(e),
        None => Arc::new(Tabula::from_config(config)),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── JSON parsing ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    extraction_method: String,
    #[serde(default)]
    page_number: Option<u32>,
    #[serde(default)]
    data: Vec<Vec<RawCell>>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(default)]
    text: String,
}

/// Parse tabula's `--format JSON` output into tables.
pub fn parse_tabula_json(bytes: &[u8]) -> Result<Vec<Table>, serde_json::Error> {
    // tabula prints nothing at all for a PDF without text layers.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let raw: Vec<RawTable> = serde_json::from_slice(bytes)?;
    let tables: Vec<Table> = raw.into_iter().map(table_from_raw).collect();
    debug!("tabula reported {} table(s)", tables.len());
    Ok(tables)
}

fn table_from_raw(raw: RawTable) -> Table {
    debug!(
        "table on page {:?} via {}: {} row(s)",
        raw.page_number,
        raw.extraction_method,
        raw.data.len()
    );

    let mut rows = raw
        .data
        .into_iter()
        .map(|row| row.into_iter().map(|c| clean_text(&c.text)).collect::<Vec<_>>());

    let Some(header) = rows.next() else {
        return Table::default();
    };

    let body: Vec<Vec<String>> = rows.collect();
    let width = body.iter().map(Vec::len).fold(header.len(), usize::max);

    let columns = header_names(&header, width);
    let cells = body
        .into_iter()
        .map(|row| row.iter().map(|t| Cell::from_text(t)).collect())
        .collect();

    let mut table = Table::new(columns, cells);
    infer_numeric_columns(&mut table);
    table
}

/// tabula joins the lines of a multi-line cell with `\r`.
fn clean_text(text: &str) -> String {
    text.replace('\r', " ").trim().to_string()
}

/// Blank headers become `Unnamed: i`; repeated headers get `.1`, `.2`, ….
///
/// The suffix keeps counting until the name is unused, so a header that
/// already reads `A.1` never collides with a generated one.
fn header_names(header: &[String], width: usize) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    (0..width)
        .map(|i| {
            let base = match header.get(i).map(|s| s.as_str()) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => format!("Unnamed: {i}"),
            };
            let mut name = base.clone();
            if used.contains(&name) {
                let n = next_suffix.entry(base.clone()).or_insert(1);
                loop {
                    name = format!("{base}.{n}");
                    *n += 1;
                    if !used.contains(&name) {
                        break;
                    }
                }
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// Convert columns whose every non-empty cell is a plain dot-decimal number.
///
/// Columns holding comma decimals stay text here; the number-format stage
/// handles those cell by cell.
fn infer_numeric_columns(table: &mut Table) {
    for idx in 0..table.width() {
        let mut any = false;
        let all_numeric = table.column(idx).all(|cell| match cell {
            Cell::Empty => true,
            Cell::Number(_) => {
                any = true;
                true
            }
            Cell::Text(s) => {
                any = true;
                parse_plain_number(s).is_some()
            }
        });

        if !(any && all_numeric) {
            continue;
        }

        for row in &mut table.rows {
            if let Some(cell) = row.get_mut(idx) {
                let parsed = match cell {
                    Cell::Text(s) => parse_plain_number(s),
                    _ => None,
                };
                if let Some(n) = parsed {
                    *cell = Cell::Number(n);
                }
            }
        }
    }
}

fn parse_plain_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {"extraction_method":"lattice","page_number":1,"top":10.0,"left":5.0,
       "data":[
         [{"text":"Sample"},{"text":"ng/ul"},{"text":"260/280"}],
         [{"text":"S1"},{"text":"4,141"},{"text":"1.88"}],
         [{"text":"S2"},{"text":"12,5"},{"text":"2.01"}]
       ]},
      {"extraction_method":"lattice","page_number":2,
       "data":[
         [{"text":""},{"text":"Note"}],
         [{"text":"S3"},{"text":"ok\rchecked"}]
       ]}
    ]"#;

    #[test]
    fn parses_header_and_rows() {
        let tables = parse_tabula_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tables.len(), 2);

        let t = &tables[0];
        assert_eq!(t.columns, vec!["Sample", "ng/ul", "260/280"]);
        assert_eq!(t.height(), 2);
        // comma decimals are left for the number-format stage
        assert_eq!(t.rows[0][1], Cell::Text("4,141".into()));
        // plain decimals are numeric
        assert_eq!(t.rows[0][2], Cell::Number(1.88));
    }

    #[test]
    fn blank_header_becomes_unnamed_and_cr_is_flattened() {
        let tables = parse_tabula_json(SAMPLE.as_bytes()).unwrap();
        let t = &tables[1];
        assert_eq!(t.columns, vec!["Unnamed: 0", "Note"]);
        assert_eq!(t.rows[0][1], Cell::Text("ok checked".into()));
    }

    #[test]
    fn duplicate_headers_are_numbered() {
        let names = header_names(&["A".into(), "A".into(), "".into(), "A".into()], 5);
        assert_eq!(names, vec!["A", "A.1", "Unnamed: 2", "A.2", "Unnamed: 4"]);
    }

    #[test]
    fn generated_suffix_skips_names_already_taken() {
        let json = r#"[{"data":[
            [{"text":"A"},{"text":"A.1"},{"text":"A"}],
            [{"text":"x"},{"text":"y"},{"text":"z"}]
        ]}]"#;
        let mut first = parse_tabula_json(json.as_bytes()).unwrap().remove(0);
        assert_eq!(first.columns, vec!["A", "A.1", "A.2"]);

        let second = parse_tabula_json(json.as_bytes()).unwrap().remove(0);
        first.append(second);
        assert_eq!(first.width(), 3);
        assert_eq!(
            first.rows[1],
            vec![
                Cell::Text("x".into()),
                Cell::Text("y".into()),
                Cell::Text("z".into())
            ]
        );
    }

    #[test]
    fn mixed_column_stays_text() {
        let json = r#"[{"data":[[{"text":"v"}],[{"text":"1.5"}],[{"text":"n/a"}],[{"text":""}]]}]"#;
        let t = &parse_tabula_json(json.as_bytes()).unwrap()[0];
        assert_eq!(t.rows[0][0], Cell::Text("1.5".into()));
        assert_eq!(t.rows[2][0], Cell::Empty);
    }

    #[test]
    fn empty_output_means_no_tables() {
        assert!(parse_tabula_json(b"").unwrap().is_empty());
        assert!(parse_tabula_json(b"[]").unwrap().is_empty());
        assert!(parse_tabula_json(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn table_without_rows_is_empty() {
        let t = &parse_tabula_json(br#"[{"data":[]}]"#).unwrap()[0];
        assert!(t.is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_tabula_json(b"Exception in thread main").is_err());
    }

    #[test]
    fn args_follow_mode_and_guess() {
        let t = Tabula {
            java: "java".into(),
            jar: "/opt/tabula/tabula.jar".into(),
            mode: ExtractionMode::Lattice,
            guess: true,
            timeout_secs: 60,
        };
        let args: Vec<String> = t
            .args(Path::new("/w/run.pdf"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[2..4], ["-jar", "/opt/tabula/tabula.jar"]);
        assert!(args.contains(&"--lattice".to_string()));
        assert!(args.contains(&"--guess".to_string()));
        assert_eq!(args.last().unwrap(), "/w/run.pdf");

        let stream = Tabula {
            mode: ExtractionMode::Stream,
            guess: false,
            ..t
        };
        let args = stream.args(Path::new("x.pdf"));
        assert!(args.iter().any(|a| a == "--stream"));
        assert!(!args.iter().any(|a| a == "--guess"));
    }

    #[tokio::test]
    async fn missing_jar_fails_before_spawning_java() {
        let t = Tabula {
            java: "/no/such/java".into(),
            jar: "/no/such/tabula.jar".into(),
            mode: ExtractionMode::Lattice,
            guess: true,
            timeout_secs: 5,
        };
        let err = t.extract(Path::new("/w/run.pdf")).await.unwrap_err();
        assert!(err.to_string().contains("tabula jar not found"), "got: {err}");
        assert!(err.to_string().starts_with("Error processing run.pdf"));
    }
}
