//! External process invocation with a hard time bound.

use crate::core::{ScanError, ScanResult};

use async_trait::async_trait;
use std::fmt::Debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Creates an output record.
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns `true` if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs engine commands.
///
/// Implementations must enforce `timeout` themselves and make sure a child
/// that exceeds it is terminated; callers rely on the bound holding.
///
/// # Errors
///
/// - `SpawnFailed` - the program could not be started.
/// - `Timeout` - the process ran past `timeout` and was killed.
/// - `Io` - collecting the output failed.
#[async_trait]
pub trait CommandRunner: Send + Sync + Debug {
    /// Runs `program` with `args` and waits at most `timeout` for it to exit.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> ScanResult<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
///
/// The child is spawned with `kill_on_drop`, so abandoning the wait on
/// timeout also kills the process.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner {
    _private: (),
}

impl TokioCommandRunner {
    /// Creates a runner.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> ScanResult<CommandOutput> {
        tracing::trace!(program, ?args, timeout_ms = timeout.as_millis() as u64, "Spawning engine command");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScanError::spawn_failed(program, e))?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(ScanError::timeout(program, timeout)),
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let runner = TokioCommandRunner::new();
        let output = runner
            .run(
                "sh",
                &args(&["-c", "echo 'stream: OK'; echo warn >&2; exit 1"]),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(1));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "stream: OK");
        assert_eq!(output.stderr.trim(), "warn");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let runner = TokioCommandRunner::new();
        let started = std::time::Instant::now();
        let err = runner
            .run("sleep", &args(&["5"]), Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let runner = TokioCommandRunner::new();
        let err = runner
            .run("scangate-no-such-binary", &[], Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(err.is_program_missing());
    }
}
