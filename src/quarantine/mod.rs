//! Quarantine storage for suspect files.
//!
//! This module provides a trait-based abstraction for quarantine storage,
//! allowing infected uploads to be moved out of their serving location
//! without being destroyed.

mod filesystem;
mod record;
mod traits;

pub use filesystem::FilesystemQuarantine;
pub use record::{QuarantineFilter, QuarantineId, QuarantineRecord};
pub use traits::QuarantineStore;
