//! Scan verdict structures.
//!
//! A [`ScanVerdict`] is the only thing a scan ever resolves to. Process
//! failures, missing files and timeouts are all expressed as verdicts, never
//! as errors, so upload handlers can branch on data alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Error message for a path that does not exist.
pub const NOT_FOUND_MESSAGE: &str = "not found";

/// Error message for a verdict issued without any engine installed.
pub const ENGINE_UNAVAILABLE_MESSAGE: &str = "engine unavailable";

/// Error message for a scan that exceeded its time bound.
pub const SCAN_TIMEOUT_MESSAGE: &str = "Scan timeout";

/// Virus name used when the engine reports a detection without a name.
pub const UNKNOWN_VIRUS_NAME: &str = "Unknown";

/// The structured result of one scan attempt.
///
/// Invariants:
/// - without an error message, exactly one of `safe` and `infected` is set;
/// - with an error message, both are `false`, except for the
///   engine-unavailable verdict which is `safe` so uploads are not blocked
///   on hosts without a scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanVerdict {
    /// The content may be served.
    pub safe: bool,

    /// The engine reported a detection.
    pub infected: bool,

    /// Signature name reported by the engine, when infected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virus_name: Option<String>,

    /// Diagnostic for inconclusive scans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Wall-clock time spent on the scan.
    pub scan_duration_ms: u64,
}

impl ScanVerdict {
    /// No threat detected.
    pub fn clean() -> Self {
        Self {
            safe: true,
            infected: false,
            virus_name: None,
            error_message: None,
            scan_duration_ms: 0,
        }
    }

    /// The engine reported `virus_name`.
    pub fn infected(virus_name: impl Into<String>) -> Self {
        Self {
            safe: false,
            infected: true,
            virus_name: Some(virus_name.into()),
            error_message: None,
            scan_duration_ms: 0,
        }
    }

    /// The scan ran but produced no usable verdict.
    ///
    /// A message equal to one of the reserved sentinels is prefixed, so
    /// engine text can never be mistaken for a gateway classification.
    pub fn inconclusive(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_reserved_message(&message) {
            return Self::failed(format!("engine reported: {message}"));
        }
        Self::failed(message)
    }

    /// The engine exceeded its time bound.
    pub fn timeout() -> Self {
        Self::failed(SCAN_TIMEOUT_MESSAGE.to_string())
    }

    /// The path to scan does not exist.
    pub fn not_found() -> Self {
        Self::failed(NOT_FOUND_MESSAGE.to_string())
    }

    fn failed(message: String) -> Self {
        Self {
            safe: false,
            infected: false,
            virus_name: None,
            error_message: Some(message),
            scan_duration_ms: 0,
        }
    }

    /// No engine is installed; the content is let through.
    pub fn engine_unavailable() -> Self {
        Self {
            safe: true,
            infected: false,
            virus_name: None,
            error_message: Some(ENGINE_UNAVAILABLE_MESSAGE.to_string()),
            scan_duration_ms: 0,
        }
    }

    /// Sets the scan duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.scan_duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the scan duration.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.scan_duration_ms)
    }

    /// Classifies this verdict.
    ///
    /// Classification keys off the sentinel messages, which only the
    /// constructors above may produce.
    pub fn kind(&self) -> VerdictKind {
        if self.infected {
            return VerdictKind::Infected;
        }
        match self.error_message.as_deref() {
            None => VerdictKind::Clean,
            Some(NOT_FOUND_MESSAGE) => VerdictKind::NotFound,
            Some(ENGINE_UNAVAILABLE_MESSAGE) => VerdictKind::EngineUnavailable,
            Some(SCAN_TIMEOUT_MESSAGE) => VerdictKind::Timeout,
            Some(_) => VerdictKind::Inconclusive,
        }
    }

    /// Returns `true` if the upload should be rejected.
    pub fn should_block(&self) -> bool {
        !self.safe
    }
}

/// Classification of a [`ScanVerdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    /// No threat detected.
    Clean,
    /// Positive detection.
    Infected,
    /// Engine ran but the output carried no verdict and stderr was non-empty.
    Inconclusive,
    /// Engine exceeded its time bound.
    Timeout,
    /// Path missing.
    NotFound,
    /// No engine installed.
    EngineUnavailable,
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Infected => write!(f, "infected"),
            Self::Inconclusive => write!(f, "inconclusive"),
            Self::Timeout => write!(f, "timeout"),
            Self::NotFound => write!(f, "not_found"),
            Self::EngineUnavailable => write!(f, "engine_unavailable"),
        }
    }
}

fn is_reserved_message(message: &str) -> bool {
    matches!(
        message,
        NOT_FOUND_MESSAGE | ENGINE_UNAVAILABLE_MESSAGE | SCAN_TIMEOUT_MESSAGE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_kinds() {
        assert_eq!(ScanVerdict::clean().kind(), VerdictKind::Clean);
        assert_eq!(ScanVerdict::infected("Eicar").kind(), VerdictKind::Infected);
        assert_eq!(ScanVerdict::timeout().kind(), VerdictKind::Timeout);
        assert_eq!(ScanVerdict::not_found().kind(), VerdictKind::NotFound);
        assert_eq!(
            ScanVerdict::engine_unavailable().kind(),
            VerdictKind::EngineUnavailable
        );
        assert_eq!(
            ScanVerdict::inconclusive("LibClamAV Error").kind(),
            VerdictKind::Inconclusive
        );
    }

    #[test]
    fn test_error_verdicts_are_neither_safe_nor_infected() {
        for verdict in [
            ScanVerdict::timeout(),
            ScanVerdict::not_found(),
            ScanVerdict::inconclusive("boom"),
        ] {
            assert!(!verdict.safe);
            assert!(!verdict.infected);
            assert!(verdict.should_block());
        }

        let unavailable = ScanVerdict::engine_unavailable();
        assert!(unavailable.safe);
        assert!(!unavailable.infected);
    }

    #[test]
    fn test_engine_text_cannot_impersonate_sentinels() {
        for text in ["not found", "Scan timeout", "engine unavailable"] {
            let verdict = ScanVerdict::inconclusive(text);
            assert_eq!(verdict.kind(), VerdictKind::Inconclusive);
            assert!(!verdict.safe);
            assert_eq!(
                verdict.error_message.as_deref(),
                Some(format!("engine reported: {text}").as_str())
            );
        }
    }

    #[test]
    fn test_verdict_serializes_camel_case() {
        let verdict = ScanVerdict::infected("MyVirus").with_duration(Duration::from_millis(42));
        let json = serde_json::to_value(&verdict).unwrap();

        assert_eq!(json["virusName"], "MyVirus");
        assert_eq!(json["scanDurationMs"], 42);
        assert_eq!(json["infected"], true);
        assert!(json.get("errorMessage").is_none());
    }
}
