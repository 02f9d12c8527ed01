//! Engine state types: availability cache entries and status reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the engine is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// A long-running daemon reached through its client binary.
    Daemon,
    /// A standalone scanner that loads signatures on every run.
    Standalone,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daemon => write!(f, "daemon"),
            Self::Standalone => write!(f, "standalone"),
        }
    }
}

/// Cached result of an availability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineAvailability {
    /// Whether any engine responded.
    pub available: bool,

    /// Mode of the first engine that responded.
    pub mode: Option<EngineMode>,

    /// When the probe ran.
    pub checked_at: DateTime<Utc>,
}

impl EngineAvailability {
    /// An engine was found in `mode`.
    pub fn available(mode: EngineMode) -> Self {
        Self {
            available: true,
            mode: Some(mode),
            checked_at: Utc::now(),
        }
    }

    /// No engine responded.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            mode: None,
            checked_at: Utc::now(),
        }
    }

    /// Time elapsed since the probe ran.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.checked_at
    }
}

/// Engine status report.
///
/// Optional fields are left empty when the auxiliary inspection command is
/// missing or its output cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    /// Whether any engine is reachable.
    pub available: bool,

    /// Mode of the reachable engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<EngineMode>,

    /// Engine version, e.g. `1.0.3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,

    /// Signature database version, e.g. `27103`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_version: Option<String>,

    /// Signature database build date as reported by the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_date: Option<String>,

    /// Number of signatures in the database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_count: Option<u64>,

    /// When this report was assembled.
    pub checked_at: DateTime<Utc>,
}

impl EngineStatus {
    /// Creates a report with only availability filled in.
    pub fn new(availability: &EngineAvailability) -> Self {
        Self {
            available: availability.available,
            mode: availability.mode,
            engine_version: None,
            database_version: None,
            database_date: None,
            signature_count: None,
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_constructors() {
        let found = EngineAvailability::available(EngineMode::Standalone);
        assert!(found.available);
        assert_eq!(found.mode, Some(EngineMode::Standalone));
        assert!(found.age() >= chrono::Duration::zero());

        let missing = EngineAvailability::unavailable();
        assert!(!missing.available);
        assert_eq!(missing.mode, None);
    }

    #[test]
    fn test_status_omits_unknown_fields() {
        let status = EngineStatus::new(&EngineAvailability::unavailable());
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["available"], false);
        assert!(json.get("engineVersion").is_none());
        assert!(json.get("signatureCount").is_none());
    }
}
