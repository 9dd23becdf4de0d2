//! CLI binary for xps2xlsx.
//!
//! `serve` runs the web front-end; `convert` runs a batch from the terminal
//! and writes the workbooks to a directory.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use xps2xlsx::{
    config::DEFAULT_TABULA_JAR, convert_paths, write_outputs, ConversionConfig,
    ConversionProgressCallback, ExtractionMode, FileStatus, ProgressCallback, ServerConfig,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch, one log line per file.
/// Files may finish out of order when `--concurrency` is above one.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        let started = match self.start_times.lock() {
            Ok(mut times) => times.remove(&index),
            Err(_) => None,
        };
        started.map_or(0.0, |t| t.elapsed().as_secs_f64())
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, index: usize, _total_files: usize, file: &str) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
        self.bar.set_message(format!("Processing {file}..."));
    }

    fn on_file_complete(&self, index: usize, total_files: usize, file: &str, tables: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total_files,
            file,
            dim(&format!("{tables} table(s)")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total_files: usize, file: &str, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total_files,
            file,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} Successfully processed {}/{} files",
                green("✔"),
                bold(&success_count.to_string()),
                total_files
            );
        } else {
            eprintln!(
                "{} Successfully processed {}/{} files  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the web front-end on the container port
  xps2xlsx serve --address 0.0.0.0 --port 8501

  # Convert reports into ./out, one workbook per file plus a combined summary
  xps2xlsx convert run1.xps run2.pdf -o out

  # Also write the ZIP bundle, skip the summary
  xps2xlsx convert *.xps -o out --zip --no-summary

  # Machine-readable results
  xps2xlsx convert run1.xps -o out --json

ENVIRONMENT VARIABLES:
  XPS2XLSX_XPSTOPDF       Path to xpstopdf (libgxps-utils)
  XPS2XLSX_JAVA           Path to the java executable
  XPS2XLSX_TABULA_JAR     Path to the tabula-java jar
  TABULA_JAR              Existing tabula jar, skips auto-download
  TABULA_AUTO_CACHE_DIR   Override the tabula download cache directory
  RUST_LOG                tracing filter, e.g. xps2xlsx=debug

SETUP:
  XPS files need xpstopdf:   sudo apt-get install libgxps-utils
  Table extraction needs a Java runtime. When no tabula jar exists at
  --tabula-jar, it is downloaded once and cached.
"#;

/// Extract tables from PDF and XPS reports into Excel workbooks.
#[derive(Parser, Debug)]
#[command(
    name = "xps2xlsx",
    version,
    about = "Extract tables from PDF and XPS reports into Excel workbooks",
    long_about = "Convert XPS files to PDF and extract tables to Excel format with \
Swedish/German number format support. Runs as a web front-end (`serve`) or a batch \
command (`convert`).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "XPS2XLSX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "XPS2XLSX_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the upload page and JSON API.
    Serve(ServeArgs),
    /// Convert files or URLs from the command line.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Interface to bind.
    #[arg(long, env = "XPS2XLSX_ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// TCP port.
    #[arg(long, env = "XPS2XLSX_PORT", default_value_t = 8501)]
    port: u16,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "XPS2XLSX_MAX_UPLOAD_MB", default_value_t = 200)]
    max_upload_mb: usize,

    /// Finished batches kept in memory for download.
    #[arg(long, env = "XPS2XLSX_MAX_JOBS", default_value_t = 32)]
    max_jobs: usize,

    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF/XPS paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Directory to write workbooks into.
    #[arg(short, long, env = "XPS2XLSX_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Also write the ZIP bundle (only produced for more than one workbook).
    #[arg(long)]
    zip: bool,

    /// Skip the combined summary workbook.
    #[arg(long, env = "XPS2XLSX_NO_SUMMARY")]
    no_summary: bool,

    /// Print the results as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "XPS2XLSX_NO_PROGRESS")]
    no_progress: bool,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "XPS2XLSX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    #[command(flatten)]
    tools: ToolArgs,
}

/// External tool settings shared by both subcommands.
#[derive(Args, Debug)]
struct ToolArgs {
    /// xpstopdf executable.
    #[arg(long, env = "XPS2XLSX_XPSTOPDF", default_value = "xpstopdf")]
    xpstopdf: PathBuf,

    /// java executable.
    #[arg(long, env = "XPS2XLSX_JAVA", default_value = "java")]
    java: PathBuf,

    /// tabula-java jar; downloaded and cached when missing.
    #[arg(long, env = "XPS2XLSX_TABULA_JAR", default_value = DEFAULT_TABULA_JAR)]
    tabula_jar: PathBuf,

    /// Table detection mode.
    #[arg(long, env = "XPS2XLSX_MODE", value_enum, default_value = "lattice")]
    mode: ModeArg,

    /// Disable tabula's table-area guessing.
    #[arg(long, env = "XPS2XLSX_NO_GUESS")]
    no_guess: bool,

    /// Files converted at the same time.
    #[arg(short, long, env = "XPS2XLSX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Timeout in seconds for each xpstopdf or tabula run.
    #[arg(long, env = "XPS2XLSX_TOOL_TIMEOUT", default_value_t = 120)]
    tool_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ModeArg {
    Lattice,
    Stream,
}

impl From<ModeArg> for ExtractionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Lattice => ExtractionMode::Lattice,
            ModeArg::Stream => ExtractionMode::Stream,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs during `convert`; `serve` keeps
    // INFO so request traces show up.
    let show_progress = match cli.command {
        Command::Convert(ref args) => !cli.quiet && !args.no_progress && !args.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info,tower_http=debug"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args, cli.quiet).await,
        Command::Convert(args) => run_convert(args, cli.quiet, show_progress).await,
    }
}

async fn run_serve(args: ServeArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args.tools, true, 120, None, quiet)?;
    let server = ServerConfig {
        address: args.address,
        port: args.port,
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
        max_retained_jobs: args.max_jobs,
    };

    xps2xlsx::serve(server, config)
        .await
        .context("Server failed")
}

async fn run_convert(args: ConvertArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(
        &args.tools,
        !args.no_summary,
        args.download_timeout,
        progress_cb,
        quiet,
    )?;

    let output = convert_paths(&args.inputs, &config)
        .await
        .context("Conversion failed")?;
    let written = write_outputs(&output, &args.output, args.zip)
        .await
        .context("Failed to write workbooks")?;

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if quiet {
        return Ok(());
    }

    println!("{}", bold("Processing Results"));
    for r in &output.results {
        let status = match r.status {
            FileStatus::Success => green(&r.status.to_string()),
            _ => red(&r.status.to_string()),
        };
        println!(
            "  {:<32} {:<16} {}  {}",
            r.file,
            status,
            r.message,
            dim(r.excel_file.as_deref().unwrap_or("")),
        );
    }

    if written.is_empty() {
        eprintln!(
            "{} No Excel files were generated. Please check the error messages above.",
            red("✘")
        );
        return Ok(());
    }

    if let Some(ref name) = output.summary_file {
        eprintln!(
            "{} Created combined summary with {} rows  →  {}",
            green("✔"),
            output.stats.summary_rows,
            bold(name)
        );
    }
    for path in &written {
        eprintln!("   {}", dim(&path.display().to_string()));
    }
    if !show_progress {
        eprintln!(
            "Successfully processed {}/{} files in {}ms",
            output.stats.success_files, output.stats.total_files, output.stats.total_duration_ms
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`, fetching the tabula jar if needed.
fn build_config(
    tools: &ToolArgs,
    include_summary: bool,
    download_timeout: u64,
    progress: Option<ProgressCallback>,
    quiet: bool,
) -> Result<ConversionConfig> {
    let jar = resolve_tabula_jar(&tools.tabula_jar, quiet)?;

    let mut builder = ConversionConfig::builder()
        .xpstopdf_bin(&tools.xpstopdf)
        .java_bin(&tools.java)
        .tabula_jar(jar)
        .extraction_mode(tools.mode.clone().into())
        .guess_areas(!tools.no_guess)
        .include_summary(include_summary)
        .concurrency(tools.concurrency)
        .tool_timeout_secs(tools.tool_timeout)
        .download_timeout_secs(download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Use `configured` when it exists, else the cached or freshly downloaded jar.
fn resolve_tabula_jar(configured: &Path, quiet: bool) -> Result<PathBuf> {
    if configured.exists() {
        return Ok(configured.to_path_buf());
    }
    if let Some(cached) = tabula_auto::cached_tabula_path() {
        return Ok(cached);
    }

    if quiet {
        return tokio::task::block_in_place(|| tabula_auto::ensure_tabula_jar(None))
            .context("Failed to download tabula-java");
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("tabula-java");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    let path = tokio::task::block_in_place(|| {
        tabula_auto::ensure_tabula_jar(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download tabula-java")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(path)
}
