//! Engine invocation.
//!
//! - [`runner`] - the `CommandRunner` seam and its `tokio::process` implementation
//! - [`mock`] - a scripted runner for tests
//! - [`strategy`] - the ordered daemon/standalone fallback chain
//! - [`parser`] - interpretation of engine output
//!
//! ## Adding an engine
//!
//! The gateway only knows about strategies, so another engine is added by
//! appending a [`ScanStrategy`] whose output follows the same
//! `FOUND`/`OK` conventions:
//!
//! ```rust,ignore
//! use scangate::config::CommandSpec;
//! use scangate::engine::{FallbackPredicate, ScanStrategy};
//!
//! let mut chain = ScanStrategy::chain_from_config(&config);
//! chain.push(ScanStrategy {
//!     mode: EngineMode::Standalone,
//!     command: CommandSpec::new("/opt/av/bin/avscan", ["--quiet"]),
//!     timeout: Duration::from_secs(120),
//!     fallback: FallbackPredicate::Never,
//! });
//! let gateway = ScannerGateway::builder().with_strategies(chain).build()?;
//! ```

pub mod mock;
pub mod parser;
pub mod runner;
pub mod strategy;

pub use mock::{MockResponse, MockRunner, RecordedCall};
pub use parser::{
    has_detection, parse_database_info, parse_scan_output, parse_version_output, DatabaseInfo,
    ParsedOutput, VersionInfo,
};
pub use runner::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use strategy::{run_strategies, ExecutedScan, FallbackPredicate, ScanStrategy};
