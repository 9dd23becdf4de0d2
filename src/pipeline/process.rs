//! Running external command-line tools with a deadline.
//!
//! Both `xpstopdf` and the tabula JVM are third-party programs that can hang
//! on a malformed input. Every invocation goes through [`run_tool`], which
//! captures stdout/stderr and kills the child when the timeout elapses
//! (`kill_on_drop` fires when the timed-out future is dropped).

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Why a tool could not be run to completion.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("'{program}' was not found on PATH")]
    NotFound { program: String },

    #[error("'{program}' timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("failed to run '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `program args…` to completion, or kill it after `timeout_secs`.
pub async fn run_tool<I, S>(
    program: &Path,
    args: I,
    timeout_secs: u64,
) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();
    let start = Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound {
                    program: name.clone(),
                }
            } else {
                ToolError::Io {
                    program: name.clone(),
                    source: e,
                }
            }
        })?;

    let output = tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| ToolError::Timeout {
        program: name.clone(),
        secs: timeout_secs,
    })?
    .map_err(|e| ToolError::Io {
        program: name.clone(),
        source: e,
    })?;

    debug!(
        "{} exited with {} in {}ms",
        name,
        output.status,
        start.elapsed().as_millis()
    );

    Ok(ToolOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
