//! # Scangate
//!
//! A fail-open gateway between upload handlers and a locally installed
//! antivirus engine.
//!
//! ## Overview
//!
//! Upload handlers hand scangate a file path or an in-memory buffer and get
//! back a [`ScanVerdict`]. Scangate:
//!
//! - Probes for the engine once and caches the answer
//! - Prefers the daemon client and falls back to the standalone scanner
//! - Bounds every engine process with a timeout and kills it on expiry
//! - Stages buffers in uniquely named temporary files that are always removed
//! - Quarantines or deletes infected files on request
//! - Emits structured audit events through `tracing`
//!
//! A host without an engine does not block uploads: every scan reports
//! `safe: true` with the `"engine unavailable"` marker and a warning is logged.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scangate::{GatewayConfig, ScannerGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = ScannerGateway::new(GatewayConfig::default())?;
//!
//!     let verdict = gateway.scan_buffer(b"file content", "report.pdf").await;
//!     if verdict.infected {
//!         println!("blocked: {:?}", verdict.virus_name);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Core**: verdicts, status reports, errors and hashing
//! - **Engine**: process execution, the fallback chain and output parsing
//! - **Gateway**: availability caching, staging and the public operations
//! - **Quarantine**: storage for infected files
//! - **Audit**: structured logging for operators

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod config;
pub mod core;
pub mod engine;
pub mod gateway;
pub mod quarantine;

// Re-export commonly used types at the crate root
pub use crate::config::{CommandSpec, EngineCommands, GatewayConfig, TimeoutConfig};
pub use crate::core::{
    ConfigError, EngineAvailability, EngineMode, EngineStatus, FileDigest, FileHasher,
    QuarantineError, ScanError, ScanRequest, ScanVerdict, VerdictKind,
};
pub use crate::engine::{CommandRunner, TokioCommandRunner};
pub use crate::gateway::{ScannerGateway, ScannerGatewayBuilder};
pub use crate::quarantine::{FilesystemQuarantine, QuarantineRecord, QuarantineStore};

/// Prelude module for convenient imports.
///
/// ```rust
/// use scangate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::GatewayConfig;
    pub use crate::core::{EngineStatus, ScanRequest, ScanVerdict, VerdictKind};
    pub use crate::engine::{CommandRunner, MockResponse, MockRunner};
    pub use crate::gateway::{ScannerGateway, ScannerGatewayBuilder};
    pub use crate::quarantine::{QuarantineRecord, QuarantineStore};
}
