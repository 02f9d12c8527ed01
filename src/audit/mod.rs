//! Structured audit logging.
//!
//! This module provides functions for emitting structured audit events
//! using the `tracing` crate. Operators rely on these to notice uploads
//! accepted without a scan, detections and remediation actions.

mod events;

pub use events::{
    emit_availability_probed, emit_database_update, emit_engine_unavailable, emit_file_deleted,
    emit_quarantine_event, emit_scan_completed,
};
