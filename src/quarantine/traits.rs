//! Quarantine store trait definition.

use crate::core::QuarantineResult;
use crate::quarantine::record::{QuarantineFilter, QuarantineRecord};

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

/// Storage that takes suspect files out of their serving location.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use scangate::quarantine::{QuarantineFilter, QuarantineRecord, QuarantineStore};
/// use scangate::core::QuarantineResult;
/// use async_trait::async_trait;
/// use std::path::Path;
///
/// #[derive(Debug)]
/// struct BucketQuarantine {
///     // Object storage client
/// }
///
/// #[async_trait]
/// impl QuarantineStore for BucketQuarantine {
///     async fn quarantine(&self, path: &Path, reason: &str) -> QuarantineResult<QuarantineRecord> {
///         // Upload, then remove the local file
///         todo!()
///     }
///
///     async fn list(&self, filter: QuarantineFilter) -> QuarantineResult<Vec<QuarantineRecord>> {
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait QuarantineStore: Send + Sync + Debug {
    /// Moves the file at `path` into quarantine.
    ///
    /// On success the file no longer exists at `path`.
    async fn quarantine(&self, path: &Path, reason: &str) -> QuarantineResult<QuarantineRecord>;

    /// Lists quarantined files matching `filter`, newest first.
    async fn list(&self, filter: QuarantineFilter) -> QuarantineResult<Vec<QuarantineRecord>>;

    /// Returns the number of quarantined files.
    async fn count(&self) -> QuarantineResult<usize> {
        Ok(self.list(QuarantineFilter::new()).await?.len())
    }
}
