//! The scanner gateway.
//!
//! [`ScannerGateway`] is the single entry point upload handlers use: it
//! decides availability, runs the scan strategy chain, turns engine output
//! into a [`ScanVerdict`](crate::core::ScanVerdict) and performs remediation.

mod availability;
mod scanner_gateway;
mod staging;

pub use availability::{probe_engine, AvailabilityCache};
pub use scanner_gateway::{ScannerGateway, ScannerGatewayBuilder};
pub use staging::StagedFile;
