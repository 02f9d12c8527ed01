//! Audit event emission functions.
//!
//! Every event goes to the `scangate::audit` tracing target with an
//! `event_type` field, so a subscriber can route compliance records
//! separately from diagnostic logs.

use crate::core::{EngineAvailability, ScanVerdict, VerdictKind};
use crate::quarantine::QuarantineRecord;

use std::path::Path;
use std::time::Duration;

/// Emits an audit event for a completed scan.
pub fn emit_scan_completed(path: &Path, verdict: &ScanVerdict) {
    let outcome = verdict.kind();
    if outcome == VerdictKind::Infected {
        tracing::warn!(
            target: "scangate::audit",
            event_type = "scan_completed",
            path = %path.display(),
            outcome = %outcome,
            virus_name = ?verdict.virus_name,
            duration_ms = verdict.scan_duration_ms,
            "Malware detected"
        );
    } else {
        tracing::info!(
            target: "scangate::audit",
            event_type = "scan_completed",
            path = %path.display(),
            outcome = %outcome,
            safe = verdict.safe,
            error_message = ?verdict.error_message,
            duration_ms = verdict.scan_duration_ms,
            "Scan completed"
        );
    }
}

/// Emits an audit event for content let through without a scan.
pub fn emit_engine_unavailable(path: &Path) {
    tracing::warn!(
        target: "scangate::audit",
        event_type = "engine_unavailable",
        path = %path.display(),
        "No antivirus engine available, file accepted without scanning"
    );
}

/// Emits an audit event for an availability probe.
pub fn emit_availability_probed(availability: &EngineAvailability) {
    tracing::info!(
        target: "scangate::audit",
        event_type = "availability_probed",
        available = availability.available,
        mode = ?availability.mode,
        checked_at = %availability.checked_at,
        "Engine availability probed"
    );
}

/// Emits an audit event for a quarantine operation.
pub fn emit_quarantine_event(record: &QuarantineRecord, operation: &str) {
    tracing::info!(
        target: "scangate::audit",
        event_type = "quarantine_operation",
        quarantine_id = %record.id,
        operation = %operation,
        original_path = %record.original_path.display(),
        quarantined_path = %record.quarantined_path.display(),
        blake3 = ?record.digest.as_ref().map(|d| d.blake3.as_str()),
        file_size = ?record.digest.as_ref().map(|d| d.size),
        reason = %record.reason,
        "Quarantine operation performed"
    );
}

/// Emits an audit event for a deleted file.
pub fn emit_file_deleted(path: &Path) {
    tracing::info!(
        target: "scangate::audit",
        event_type = "file_deleted",
        path = %path.display(),
        "Infected file deleted"
    );
}

/// Emits an audit event for a signature database update.
pub fn emit_database_update(success: bool, duration: Duration) {
    tracing::info!(
        target: "scangate::audit",
        event_type = "database_update",
        success,
        duration_ms = duration.as_millis() as u64,
        "Signature database update finished"
    );
}
