//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through a batch.
//!
//! # Example
//!
//! ```rust
//! use xps2xlsx::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total_files: usize, file: &str, tables: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} ({} tables)", index, total_files, file, tables);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each file.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the
/// per-file methods are called from several tasks at once. All methods have
/// default no-op implementations so callers only override what they need.
///
/// `index` is the 1-based position of the file in the upload order.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any file is touched.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file enters the pipeline.
    fn on_file_start(&self, index: usize, total_files: usize, file: &str) {
        let _ = (index, total_files, file);
    }

    /// Called when a file produced a workbook.
    fn on_file_complete(&self, index: usize, total_files: usize, file: &str, tables: usize) {
        let _ = (index, total_files, file, tables);
    }

    /// Called when a file failed; `error` is the message shown to the user.
    fn on_file_error(&self, index: usize, total_files: usize, file: &str, error: &str) {
        let _ = (index, total_files, file, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
