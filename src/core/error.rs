//! Error types for the scangate library.
//!
//! These errors describe failures inside the gateway: spawning engine
//! processes, moving files around, loading configuration. The public scan
//! surface folds them into a [`ScanVerdict`](crate::core::ScanVerdict) and
//! the remediation surface folds them into booleans, so callers of
//! [`ScannerGateway`](crate::ScannerGateway) never see them directly.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure while invoking an engine command.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The program could not be started at all.
    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded its time bound and was killed.
    #[error("'{program}' timed out after {elapsed:?}")]
    Timeout {
        /// Program that was invoked.
        program: String,
        /// Bound that was exceeded.
        elapsed: Duration,
    },

    /// Every configured scan strategy reported the engine as down.
    #[error("no scan strategy could reach the engine: {reason}")]
    EngineUnavailable {
        /// Diagnostic from the last strategy attempted.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Returns `true` if the program binary itself does not exist.
    pub fn is_program_missing(&self) -> bool {
        matches!(
            self,
            Self::SpawnFailed { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Returns `true` if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Creates a `SpawnFailed` error.
    pub fn spawn_failed(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(program: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            program: program.into(),
            elapsed,
        }
    }
}

/// Error type for quarantine operations.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// The file to quarantine does not exist.
    #[error("source file not found: {}", path.display())]
    SourceNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// The source path has no usable file name.
    #[error("path has no file name: {}", path.display())]
    InvalidPath {
        /// Offending path.
        path: PathBuf,
    },

    /// Failed to move the file into quarantine.
    #[error("failed to store file in quarantine: {reason}")]
    StoreFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to read quarantine records.
    #[error("failed to read quarantine records: {reason}")]
    RetrieveFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`GatewayConfig`](crate::GatewayConfig).
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range or missing.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized `Result` type for engine invocations.
pub type ScanResult<T> = Result<T, ScanError>;

/// A specialized `Result` type for quarantine operations.
pub type QuarantineResult<T> = Result<T, QuarantineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_missing_detection() {
        let missing = ScanError::spawn_failed(
            "clamdscan",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(missing.is_program_missing());

        let denied = ScanError::spawn_failed(
            "clamdscan",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!denied.is_program_missing());
        assert!(!ScanError::timeout("clamscan", Duration::from_secs(60)).is_program_missing());
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::timeout("clamdscan", Duration::from_secs(30));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("clamdscan"));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_quarantine_error_display() {
        let err = QuarantineError::SourceNotFound {
            path: PathBuf::from("/uploads/a.exe"),
        };
        assert_eq!(err.to_string(), "source file not found: /uploads/a.exe");
    }
}
