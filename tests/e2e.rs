//! End-to-end integration tests for xps2xlsx.
//!
//! These run the real `xpstopdf` and tabula-java against reports placed in
//! `./test_cases/`. They are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 TABULA_JAR=/opt/tabula/tabula.jar cargo test --test e2e -- --nocapture

use std::path::PathBuf;
use xps2xlsx::{convert_paths, convert_to_dir, ConversionConfig, FileStatus, Xps2XlsxError};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Every report in `test_cases/` with the given extension.
fn reports(ext: &str) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(test_cases_dir()) else {
        return Vec::new();
    };
    let mut found: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .is_some_and(|x| x.to_string_lossy().eq_ignore_ascii_case(ext))
        })
        .map(|p| p.display().to_string())
        .collect();
    found.sort();
    found
}

fn e2e_config() -> ConversionConfig {
    let mut builder = ConversionConfig::builder().concurrency(2);
    if let Ok(jar) = std::env::var("TABULA_JAR") {
        builder = builder.tabula_jar(jar);
    }
    builder.build().unwrap()
}

/// Skip this test if E2E_ENABLED is not set *or* no report exists.
macro_rules! e2e_skip_unless_ready {
    ($files:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let files: Vec<String> = $files;
        if files.is_empty() {
            println!("SKIP — no reports found in {}", test_cases_dir().display());
            return;
        }
        files
    }};
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_pdf_reports() {
    let files = e2e_skip_unless_ready!(reports("pdf"));

    let output = convert_paths(&files, &e2e_config()).await.unwrap();
    for r in &output.results {
        println!("{} | {} | {}", r.file, r.status, r.message);
    }

    assert_eq!(output.results.len(), files.len());
    assert!(
        output.results.iter().any(|r| r.status == FileStatus::Success),
        "at least one PDF should yield tables"
    );
    for f in &output.files {
        assert!(f.bytes.starts_with(b"PK\x03\x04"), "{} is not an xlsx", f.name);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_xps_reports() {
    let files = e2e_skip_unless_ready!(reports("xps"));

    let output = convert_paths(&files, &e2e_config()).await.unwrap();
    for r in &output.results {
        println!("{} | {} | {}", r.file, r.status, r.message);
        if r.is_success() {
            assert!(r.message.starts_with("XPS→PDF→Excel: "), "{}", r.message);
        }
    }
    assert_eq!(output.results.len(), files.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_convert_to_dir_writes_workbooks() {
    let mut files = reports("pdf");
    files.extend(reports("xps"));
    let files = e2e_skip_unless_ready!(files);

    let dir = tempfile::tempdir().unwrap();
    let output = convert_to_dir(&files, dir.path(), &e2e_config())
        .await
        .unwrap();

    for f in &output.files {
        let path = dir.path().join(&f.name);
        assert!(path.exists(), "missing {}", path.display());
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, f.size);
    }
    println!(
        "{} workbook(s), {} summary row(s)",
        output.files.len(),
        output.stats.summary_rows
    );
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let missing = test_cases_dir().join("does-not-exist.pdf");
    let err = convert_paths(&[missing.display().to_string()], &e2e_config())
        .await
        .unwrap_err();
    assert!(matches!(err, Xps2XlsxError::FileNotFound { .. }), "{err}");
}
