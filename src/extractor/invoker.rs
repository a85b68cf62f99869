//! External process invocation
//!
//! Commands are always built as argument vectors and handed to the process
//! launcher directly; nothing is ever passed through a shell. Every run is
//! bounded in time and in captured output.

use crate::utils::error::{Result, SocialSaveError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, warn};

/// Longest stderr excerpt carried inside an error message
const STDERR_EXCERPT: usize = 500;

/// Argument vector for a single tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bare flag such as `--no-warnings`.
    pub fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.to_string());
        self
    }

    /// Append a flag followed by its value as a separate argument.
    pub fn option(mut self, name: &str, value: impl Into<String>) -> Self {
        self.args.push(name.to_string());
        self.args.push(value.into());
        self
    }

    /// Append a path-valued option.
    pub fn path_option(self, name: &str, path: &Path) -> Self {
        let value = path.to_string_lossy().into_owned();
        self.option(name, value)
    }

    /// Terminate option parsing and append the untrusted target.
    ///
    /// The `--` guarantees the target is read as a positional argument even
    /// if it starts with a dash.
    pub fn target(mut self, target: &str) -> Self {
        self.args.push("--".to_string());
        self.args.push(target.to_string());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Value following `name`, if present.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == name)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Execution bounds for a single run
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Short name for logs and timeout errors ("metadata lookup", "download", ...)
    pub operation: &'static str,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

/// Executes tool invocations. The seam between the service and the process
/// table, so tests can substitute a recording double.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Identifier for logs (e.g. "yt-dlp")
    fn id(&self) -> &str;

    /// Run the invocation to completion and return its stdout.
    async fn run(&self, invocation: &Invocation, limits: RunLimits) -> Result<String>;
}

/// Runs a real executable with tokio's process support
pub struct ProcessRunner {
    program: PathBuf,
    name: String,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.to_string_lossy().into_owned());
        Self { program, name }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn id(&self) -> &str {
        &self.name
    }

    async fn run(&self, invocation: &Invocation, limits: RunLimits) -> Result<String> {
        debug!("Running {} for {}: {:?}", self.name, limits.operation, invocation.args());
        let started = Instant::now();

        // kill_on_drop: a dropped request future (client went away) or a
        // timeout takes the child process down with it.
        let mut child = AsyncCommand::new(&self.program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    error!("{} not found at {}", self.name, self.program.display());
                    SocialSaveError::YtDlpNotFound
                } else {
                    SocialSaveError::ToolFailure(format!("Failed to start {}: {}", self.name, e))
                }
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SocialSaveError::ToolFailure(format!("Failed to capture stdout from {}", self.name))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            SocialSaveError::ToolFailure(format!("Failed to capture stderr from {}", self.name))
        })?;

        let max = limits.max_output_bytes;
        let collected = tokio::time::timeout(limits.timeout, async {
            let (out, err) = tokio::try_join!(read_bounded(stdout, max), read_bounded(stderr, max))?;
            let status = child.wait().await?;
            Ok::<_, SocialSaveError>((status, out, err))
        })
        .await;

        let (status, out, err) = match collected {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                let _ = child.start_kill();
                warn!("{} {} aborted: {}", self.name, limits.operation, e);
                return Err(pipe_failure(&self.name, e));
            }
            Err(_) => {
                let _ = child.start_kill();
                warn!(
                    "{} {} timed out after {:?}",
                    self.name, limits.operation, limits.timeout
                );
                return Err(SocialSaveError::ToolTimeout {
                    operation: limits.operation,
                    secs: limits.timeout.as_secs(),
                });
            }
        };

        debug!(
            "{} {} finished with {} in {:?}",
            self.name,
            limits.operation,
            status,
            started.elapsed()
        );

        if !status.success() {
            let message = stderr_excerpt(&err);
            error!("{} {} failed: {}", self.name, limits.operation, message);
            return Err(SocialSaveError::ToolFailure(if message.is_empty() {
                format!("{} exited with {}", self.name, status)
            } else {
                message
            }));
        }

        String::from_utf8(out).map_err(|e| {
            SocialSaveError::ParseError(format!("{} produced non UTF-8 output: {}", self.name, e))
        })
    }
}

/// Read a stream to the end, failing as soon as it grows past `max` bytes.
async fn read_bounded<R>(reader: R, max: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = (max as u64).saturating_add(1);
    reader.take(limit).read_to_end(&mut buf).await?;
    if buf.len() > max {
        return Err(SocialSaveError::OutputTooLarge { limit: max });
    }
    Ok(buf)
}

/// Losing the child's pipes is a failure of the tool run, not of the server.
fn pipe_failure(name: &str, err: SocialSaveError) -> SocialSaveError {
    match err {
        SocialSaveError::IoError(e) => {
            SocialSaveError::ToolFailure(format!("Lost contact with {}: {}", name, e))
        }
        other => other,
    }
}

/// Last meaningful part of stderr, trimmed to a loggable size.
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_EXCERPT {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_EXCERPT;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}
