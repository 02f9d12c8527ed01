//! Ordered scan strategies with daemon-down fallback.
//!
//! A scan walks the strategy list in order. A strategy hands over to the
//! next one only when its [`FallbackPredicate`] says the engine behind it is
//! not running; any other failure, including a timeout, ends the walk.

use crate::config::{CommandSpec, GatewayConfig};
use crate::core::{EngineMode, ScanError, ScanResult};
use crate::engine::parser::has_detection;
use crate::engine::runner::{CommandOutput, CommandRunner};

use std::path::Path;
use std::time::Duration;

/// Decides whether a strategy's failure should move the scan to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackPredicate {
    /// Fall back when the program is missing or its output contains one of
    /// the markers without a detection.
    DaemonDown {
        /// Output fragments meaning the daemon is not running.
        markers: Vec<String>,
    },
    /// Never fall back.
    Never,
}

impl FallbackPredicate {
    /// Checks a completed process.
    pub fn matches_output(&self, output: &CommandOutput) -> bool {
        match self {
            Self::Never => false,
            Self::DaemonDown { markers } => {
                !has_detection(&output.stdout)
                    && markers
                        .iter()
                        .any(|m| output.stdout.contains(m) || output.stderr.contains(m))
            }
        }
    }

    /// Checks a failed invocation.
    pub fn matches_error(&self, error: &ScanError) -> bool {
        match self {
            Self::Never => false,
            Self::DaemonDown { .. } => error.is_program_missing(),
        }
    }
}

/// One way of invoking the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanStrategy {
    /// Mode this strategy exercises.
    pub mode: EngineMode,
    /// Program and leading arguments; the file path is appended.
    pub command: CommandSpec,
    /// Time bound for one scan.
    pub timeout: Duration,
    /// When to hand over to the next strategy.
    pub fallback: FallbackPredicate,
}

impl ScanStrategy {
    /// Arguments for scanning `path`.
    pub fn args_for(&self, path: &Path) -> Vec<String> {
        let mut args = self.command.args.clone();
        args.push(path.to_string_lossy().into_owned());
        args
    }

    /// Builds the daemon-client then standalone-scanner chain from `config`.
    pub fn chain_from_config(config: &GatewayConfig) -> Vec<ScanStrategy> {
        vec![
            ScanStrategy {
                mode: EngineMode::Daemon,
                command: config.commands.daemon_scan.clone(),
                timeout: config.timeouts.daemon_scan(),
                fallback: FallbackPredicate::DaemonDown {
                    markers: config.daemon_down_markers.clone(),
                },
            },
            ScanStrategy {
                mode: EngineMode::Standalone,
                command: config.commands.standalone_scan.clone(),
                timeout: config.timeouts.standalone_scan(),
                fallback: FallbackPredicate::Never,
            },
        ]
    }
}

/// A scan that produced output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedScan {
    /// Mode of the strategy that produced the output.
    pub mode: EngineMode,
    /// Captured output.
    pub output: CommandOutput,
}

/// Runs `strategies` in order against `path`.
///
/// The last strategy's result is returned as-is, even if it matches its
/// own fallback predicate.
pub async fn run_strategies(
    runner: &dyn CommandRunner,
    strategies: &[ScanStrategy],
    path: &Path,
) -> ScanResult<ExecutedScan> {
    let mut last_reason = String::from("no scan strategies configured");

    for (index, strategy) in strategies.iter().enumerate() {
        let has_next = index + 1 < strategies.len();
        let args = strategy.args_for(path);

        match runner
            .run(&strategy.command.program, &args, strategy.timeout)
            .await
        {
            Ok(output) if has_next && strategy.fallback.matches_output(&output) => {
                tracing::warn!(
                    mode = %strategy.mode,
                    program = %strategy.command.program,
                    stderr = %output.stderr.trim(),
                    "Engine not running, falling back to next scan strategy"
                );
                last_reason = output.stderr.trim().to_string();
            }
            Ok(output) => {
                return Ok(ExecutedScan {
                    mode: strategy.mode,
                    output,
                });
            }
            Err(e) if has_next && strategy.fallback.matches_error(&e) => {
                tracing::warn!(
                    mode = %strategy.mode,
                    program = %strategy.command.program,
                    error = %e,
                    "Scan program unavailable, falling back to next scan strategy"
                );
                last_reason = e.to_string();
            }
            Err(e) => return Err(e),
        }
    }

    Err(ScanError::EngineUnavailable {
        reason: last_reason,
    })
}
