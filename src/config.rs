//! Configuration types for XPS/PDF-to-Excel conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The HTTP front-end has its own
//! [`ServerConfig`] because nothing about listening sockets belongs in a
//! library call that converts files.

use crate::error::Xps2XlsxError;
use crate::pipeline::tables::TableExtractor;
use crate::pipeline::xps::XpsConverter;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default location of the tabula jar inside the container image.
pub const DEFAULT_TABULA_JAR: &str = "/opt/tabula/tabula.jar";

/// Configuration for converting a batch of uploaded reports.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use xps2xlsx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .concurrency(2)
///     .include_summary(false)
///     .tabula_jar("/srv/tabula.jar")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Executable used to turn XPS into PDF. Default: `xpstopdf`.
    pub xpstopdf_bin: PathBuf,

    /// Java launcher used to run tabula. Default: `java`.
    pub java_bin: PathBuf,

    /// Path to the tabula-java `jar-with-dependencies`. Default: `/opt/tabula/tabula.jar`.
    pub tabula_jar: PathBuf,

    /// Table detection strategy handed to tabula. Default: [`ExtractionMode::Lattice`].
    pub extraction_mode: ExtractionMode,

    /// Also let tabula guess table areas. Default: true.
    pub guess_areas: bool,

    /// Build the combined Sample / ng/ul / 260/280 workbook. Default: true.
    pub include_summary: bool,

    /// Files converted at the same time within one batch. Default: 4.
    ///
    /// Each file runs one `xpstopdf` and one JVM, so this bounds how many
    /// JVMs a single upload can spawn.
    pub concurrency: usize,

    /// Hard limit for one external tool invocation, in seconds. Default: 120.
    pub tool_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Pre-constructed table extractor. Takes precedence over the tabula settings.
    pub extractor: Option<Arc<dyn TableExtractor>>,

    /// Pre-constructed XPS converter. Takes precedence over `xpstopdf_bin`.
    pub xps_converter: Option<Arc<dyn XpsConverter>>,

    /// Progress events for each file of a batch.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            xpstopdf_bin: PathBuf::from("xpstopdf"),
            java_bin: PathBuf::from("java"),
            tabula_jar: PathBuf::from(DEFAULT_TABULA_JAR),
            extraction_mode: ExtractionMode::default(),
            guess_areas: true,
            include_summary: true,
            concurrency: 4,
            tool_timeout_secs: 120,
            download_timeout_secs: 120,
            extractor: None,
            xps_converter: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("xpstopdf_bin", &self.xpstopdf_bin)
            .field("java_bin", &self.java_bin)
            .field("tabula_jar", &self.tabula_jar)
            .field("extraction_mode", &self.extraction_mode)
            .field("guess_areas", &self.guess_areas)
            .field("include_summary", &self.include_summary)
            .field("concurrency", &self.concurrency)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn TableExtractor>"))
            .field(
                "xps_converter",
                &self.xps_converter.as_ref().map(|_| "<dyn XpsConverter>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn xpstopdf_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.xpstopdf_bin = path.into();
        self
    }

    pub fn java_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.java_bin = path.into();
        self
    }

    pub fn tabula_jar(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tabula_jar = path.into();
        self
    }

    pub fn extraction_mode(mut self, mode: ExtractionMode) -> Self {
        self.config.extraction_mode = mode;
        self
    }

    pub fn guess_areas(mut self, v: bool) -> Self {
        self.config.guess_areas = v;
        self
    }

    pub fn include_summary(mut self, v: bool) -> Self {
        self.config.include_summary = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TableExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn xps_converter(mut self, converter: Arc<dyn XpsConverter>) -> Self {
        self.config.xps_converter = Some(converter);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Xps2XlsxError> {
        let c = &self.config;
        if c.tool_timeout_secs == 0 {
            return Err(Xps2XlsxError::InvalidConfig(
                "Tool timeout must be ≥ 1 second".into(),
            ));
        }
        if c.xpstopdf_bin.as_os_str().is_empty() || c.java_bin.as_os_str().is_empty() {
            return Err(Xps2XlsxError::InvalidConfig(
                "Tool paths must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// How tabula locates tables on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionMode {
    /// Use ruling lines to find cell boundaries (instrument reports draw them). (default)
    #[default]
    Lattice,
    /// Use whitespace between columns.
    Stream,
}

impl ExtractionMode {
    /// The tabula-java command-line flag for this mode.
    pub fn flag(self) -> &'static str {
        match self {
            ExtractionMode::Lattice => "--lattice",
            ExtractionMode::Stream => "--stream",
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP front-end started by `xps2xlsx serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub address: String,

    /// TCP port. Default: 8501, the port the container exposes.
    pub port: u16,

    /// Largest accepted request body in bytes. Default: 200 MiB.
    pub max_upload_bytes: usize,

    /// Finished batches kept in memory for download. Default: 32.
    ///
    /// The oldest batch is evicted first once the limit is reached.
    pub max_retained_jobs: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8501,
            max_upload_bytes: 200 * 1024 * 1024,
            max_retained_jobs: 32,
        }
    }
}

impl ServerConfig {
    /// `address:port`, ready for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_container_layout() {
        let c = ConversionConfig::default();
        assert_eq!(c.xpstopdf_bin, PathBuf::from("xpstopdf"));
        assert_eq!(c.tabula_jar, PathBuf::from(DEFAULT_TABULA_JAR));
        assert_eq!(c.extraction_mode, ExtractionMode::Lattice);
        assert!(c.guess_areas);
        assert!(c.include_summary);

        let s = ServerConfig::default();
        assert_eq!(s.bind_addr(), "0.0.0.0:8501");
    }

    #[test]
    fn concurrency_is_clamped_to_one() {
        let c = ConversionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ConversionConfig::builder()
            .tool_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"), "got: {err}");
    }

    #[test]
    fn debug_hides_trait_objects() {
        let dbg = format!("{:?}", ConversionConfig::default());
        assert!(dbg.contains("extractor: None"));
        assert!(dbg.contains("tabula_jar"));
    }

    #[test]
    fn mode_flags() {
        assert_eq!(ExtractionMode::Lattice.flag(), "--lattice");
        assert_eq!(ExtractionMode::Stream.flag(), "--stream");
    }
}
