//! Streaming conversion API: emit files as they complete.
//!
//! A batch of twenty XPS reports takes a while, mostly spent in the JVM.
//! [`convert_stream`] yields each [`FileOutcome`] the moment its file
//! finishes so a caller can fill in the results table row by row. Outcomes
//! arrive in completion order; sort by `result.index` if upload order
//! matters.
//!
//! The stream does not build the combined summary or the ZIP bundle. Use
//! [`crate::convert::convert_batch`] when those are needed.

use crate::config::ConversionConfig;
use crate::convert::{convert_one, Toolchain};
use crate::error::Xps2XlsxError;
use crate::output::FileOutcome;
use crate::pipeline::input::InputFile;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file outcomes.
pub type FileStream = Pin<Box<dyn Stream<Item = FileOutcome> + Send>>;

/// Convert a batch, streaming each file's outcome as soon as it is ready.
///
/// # Returns
/// - `Ok(FileStream)`: one item per input, failures included
/// - `Err(Xps2XlsxError::EmptyBatch)`: no inputs at all
///
/// # Example
/// ```rust,no_run
/// use xps2xlsx::{convert_stream, ConversionConfig, InputFile};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("run1.xps")?;
/// let config = ConversionConfig::default();
/// let mut stream = convert_stream(vec![InputFile::new("run1.xps", bytes)], &config)?;
/// while let Some(outcome) = stream.next().await {
///     let r = outcome.result;
///     println!("{} | {} | {}", r.file, r.status, r.message);
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream(
    inputs: Vec<InputFile>,
    config: &ConversionConfig,
) -> Result<FileStream, Xps2XlsxError> {
    if inputs.is_empty() {
        return Err(Xps2XlsxError::EmptyBatch);
    }

    let total = inputs.len();
    info!("Starting streaming batch of {} file(s)", total);

    let tools = Toolchain::from_config(config);
    let concurrency = config.concurrency.max(1);
    let config = config.clone();

    let s = stream::iter(inputs.into_iter().enumerate().map(move |(i, file)| {
        let tools = tools.clone();
        let cfg = config.clone();
        async move { convert_one(i + 1, total, file, &tools, &cfg).await }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
