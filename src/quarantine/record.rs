//! Quarantine record types.

use crate::core::FileDigest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a quarantined file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarantineId(pub String);

impl QuarantineId {
    /// Creates a new random quarantine ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QuarantineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QuarantineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata about a quarantined file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    /// Unique identifier for this record.
    pub id: QuarantineId,

    /// Where the file lived before it was quarantined.
    pub original_path: PathBuf,

    /// Basename preserved in the quarantined name.
    pub original_filename: String,

    /// Where the file lives now.
    pub quarantined_path: PathBuf,

    /// Content digest, absent if the file could not be read before the move.
    pub digest: Option<FileDigest>,

    /// When the file was quarantined.
    pub quarantined_at: DateTime<Utc>,

    /// Why the file was quarantined.
    pub reason: String,
}

/// Filter for listing quarantine records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuarantineFilter {
    /// Only records at or after this instant.
    pub quarantined_after: Option<DateTime<Utc>>,

    /// Only records at or before this instant.
    pub quarantined_before: Option<DateTime<Utc>>,

    /// Only records whose content has this BLAKE3 hash.
    pub blake3: Option<String>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,

    /// Offset for pagination.
    pub offset: Option<usize>,
}

impl QuarantineFilter {
    /// Creates a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by date range.
    pub fn with_date_range(
        mut self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.quarantined_after = after;
        self.quarantined_before = before;
        self
    }

    /// Filters by content hash.
    pub fn with_blake3(mut self, hash: impl Into<String>) -> Self {
        self.blake3 = Some(hash.into());
        self
    }

    /// Sets pagination.
    pub fn with_pagination(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Checks if a record matches this filter.
    pub fn matches(&self, record: &QuarantineRecord) -> bool {
        if let Some(after) = self.quarantined_after {
            if record.quarantined_at < after {
                return false;
            }
        }

        if let Some(before) = self.quarantined_before {
            if record.quarantined_at > before {
                return false;
            }
        }

        if let Some(ref hash) = self.blake3 {
            if record.digest.as_ref().map(|d| &d.blake3) != Some(hash) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_record() -> QuarantineRecord {
        QuarantineRecord {
            id: QuarantineId::new(),
            original_path: PathBuf::from("/srv/uploads/invoice.pdf"),
            original_filename: "invoice.pdf".into(),
            quarantined_path: PathBuf::from("quarantine/20240101T000000000Z_invoice.pdf"),
            digest: Some(FileDigest {
                blake3: "abc123".into(),
                size: 10,
            }),
            quarantined_at: Utc::now(),
            reason: "Eicar-Signature".into(),
        }
    }

    #[test]
    fn test_quarantine_id() {
        assert_ne!(QuarantineId::new(), QuarantineId::new());
        let id = QuarantineId("custom-id".into());
        assert_eq!(id.as_str(), "custom-id");
        assert_eq!(id.to_string(), "custom-id");
    }

    #[test]
    fn test_quarantine_filter() {
        let record = make_test_record();

        assert!(QuarantineFilter::new().matches(&record));
        assert!(QuarantineFilter::new().with_blake3("abc123").matches(&record));
        assert!(!QuarantineFilter::new().with_blake3("other").matches(&record));

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(!QuarantineFilter::new()
            .with_date_range(Some(future), None)
            .matches(&record));
        assert!(QuarantineFilter::new()
            .with_date_range(None, Some(future))
            .matches(&record));
    }

    #[test]
    fn test_record_json_roundtrip() {
        let record = make_test_record();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: QuarantineRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
