//! Core types for the scangate library.
//!
//! - [`verdict`] - `ScanVerdict` and its classification
//! - [`types`] - engine availability and status reports
//! - [`error`] - structured internal error types
//! - [`input`] - path/buffer scan requests
//! - [`hasher`] - BLAKE3 content hashing

pub mod error;
pub mod hasher;
pub mod input;
pub mod types;
pub mod verdict;

pub use error::{ConfigError, QuarantineError, QuarantineResult, ScanError, ScanResult};
pub use hasher::{FileDigest, FileHasher};
pub use input::{sanitize_filename, ScanRequest};
pub use types::{EngineAvailability, EngineMode, EngineStatus};
pub use verdict::{ScanVerdict, VerdictKind};
