//! Process launching functionality.

use crate::cancel::CancellationToken;
use crate::config::LaunchConfig;
use crate::error::{MacpackError, Result};
use crate::platform;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of a completed helper run.
#[derive(Debug, Clone)]
pub struct LaunchOutput {
    /// Absolute, normalized bundle path handed to the helper.
    pub bundle_path: PathBuf,
    /// Combined stdout and stderr, in the order the helper wrote them.
    pub output: String,
    /// Exit code, if the helper exited normally.
    pub exit_code: Option<i32>,
    /// When the helper was spawned.
    pub started_at: DateTime<Utc>,
    /// Wall time until the helper exited.
    pub duration: Duration,
}

impl LaunchOutput {
    /// Whether the helper exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the helper executable against a bundle and waits for it.
#[derive(Debug, Clone)]
pub struct Launcher {
    helper_path: PathBuf,
    timeout: Option<Duration>,
}

impl Launcher {
    /// Create a launcher for the helper at `helper_path`, with no timeout.
    pub fn new(helper_path: impl Into<PathBuf>) -> Self {
        Self {
            helper_path: helper_path.into(),
            timeout: None,
        }
    }

    /// Kill the helper if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn helper_path(&self) -> &Path {
        &self.helper_path
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run the helper for `bundle_path` and block until it exits.
    pub fn run(&self, bundle_path: &Path) -> Result<LaunchOutput> {
        self.run_with_cancel(bundle_path, &CancellationToken::new())
    }

    /// Like [`Launcher::run`], but stops waiting (and kills the helper) once
    /// `cancel` is triggered. An already cancelled token never spawns.
    ///
    /// A non-zero exit code is reported in [`LaunchOutput::exit_code`], not as
    /// an error. The helper being killed by a signal is
    /// [`MacpackError::ProcessExecution`].
    pub fn run_with_cancel(
        &self,
        bundle_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<LaunchOutput> {
        let bundle_path = platform::normalize_path(bundle_path)?;

        if !self.helper_path.is_file() {
            return Err(MacpackError::ProcessLaunch {
                executable: self.helper_path.clone(),
                message: "Helper executable not found".to_string(),
                source: None,
            });
        }

        cancel.check()?;

        // One file behind both stdout and stderr keeps the streams interleaved
        // exactly as the helper wrote them.
        let mut capture = tempfile::tempfile().map_err(|e| MacpackError::Io {
            message: "create output capture file".to_string(),
            path: None,
            source: Some(e),
        })?;
        let stdout_file = capture.try_clone()?;
        let stderr_file = capture.try_clone()?;

        let mut cmd = Command::new(&self.helper_path);
        cmd.arg(&bundle_path);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::from(stdout_file));
        cmd.stderr(Stdio::from(stderr_file));

        info!(
            "Launching {} for {}",
            self.helper_path.display(),
            bundle_path.display()
        );

        let started_at = Utc::now();
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn helper: {}", e);
            MacpackError::ProcessLaunch {
                executable: self.helper_path.clone(),
                message: format!("Failed to spawn process: {}", e),
                source: Some(e),
            }
        })?;
        drop(cmd);

        debug!("Helper running with PID {}", child.id());

        let status = match self.wait(&mut child, start, cancel) {
            Ok(status) => status,
            Err(e) => {
                Self::terminate(&mut child);
                return Err(match e {
                    MacpackError::ProcessExecution { message, .. } => {
                        MacpackError::ProcessExecution {
                            message,
                            output: Self::read_capture(&mut capture).unwrap_or_default(),
                        }
                    }
                    other => other,
                });
            }
        };
        let duration = start.elapsed();

        let output = Self::read_capture(&mut capture)?;

        match status.code() {
            Some(code) => {
                info!("Helper exited with code {} after {:?}", code, duration);
                Ok(LaunchOutput {
                    bundle_path,
                    output,
                    exit_code: Some(code),
                    started_at,
                    duration,
                })
            }
            None => {
                warn!("Helper terminated abnormally: {}", status);
                Err(MacpackError::ProcessExecution {
                    message: format!("helper terminated abnormally ({})", status),
                    output,
                })
            }
        }
    }

    /// Poll the child until it exits, the token is cancelled, or the deadline passes.
    fn wait(
        &self,
        child: &mut Child,
        start: Instant,
        cancel: &CancellationToken,
    ) -> Result<ExitStatus> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    return Err(MacpackError::ProcessExecution {
                        message: format!("Failed to wait for helper: {}", e),
                        output: String::new(),
                    })
                }
            }

            if cancel.is_cancelled() {
                info!("Run cancelled, stopping helper");
                return Err(MacpackError::Cancelled);
            }

            if let Some(timeout) = self.timeout {
                if start.elapsed() >= timeout {
                    warn!("Helper did not exit within {:?}", timeout);
                    return Err(MacpackError::Timeout(timeout));
                }
            }

            std::thread::sleep(LaunchConfig::POLL_INTERVAL);
        }
    }

    /// Kill and reap the child so no zombie is left behind.
    fn terminate(child: &mut Child) {
        if let Err(e) = child.kill() {
            debug!("Failed to kill helper {}: {}", child.id(), e);
        }
        if let Err(e) = child.wait() {
            warn!("Failed to reap helper {}: {}", child.id(), e);
        }
    }

    fn read_capture(capture: &mut File) -> Result<String> {
        // The child's handles share this file's offset; rewind before reading.
        capture.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        capture.read_to_end(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
