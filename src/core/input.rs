//! Scan request abstraction.
//!
//! Upload handlers hand the gateway either a path that already exists on
//! disk or the raw bytes of an upload. Byte requests are staged to a
//! temporary file first because the engine's command-line tools only accept
//! paths.

use std::path::{Path, PathBuf};

/// Content to scan.
///
/// # Examples
///
/// ```rust
/// use scangate::core::ScanRequest;
///
/// let on_disk = ScanRequest::from_path("/srv/uploads/report.pdf");
/// assert_eq!(on_disk.filename(), Some("report.pdf"));
///
/// let upload = ScanRequest::from_bytes(b"%PDF-1.7".to_vec(), "report.pdf");
/// assert_eq!(upload.size_hint(), Some(8));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum ScanRequest {
    /// A file path on disk.
    Path(PathBuf),

    /// In-memory bytes with the original upload name.
    Bytes {
        /// The file data.
        data: Vec<u8>,
        /// Original filename, used to name the staging file.
        filename: String,
    },
}

impl std::fmt::Debug for ScanRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes { data, filename } => f
                .debug_struct("Bytes")
                .field("data_len", &data.len())
                .field("filename", filename)
                .finish(),
        }
    }
}

impl ScanRequest {
    /// Creates a request for a file on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a request for an in-memory upload.
    pub fn from_bytes(data: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self::Bytes {
            data: data.into(),
            filename: filename.into(),
        }
    }

    /// Returns the filename, if known.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Path(path) => path.file_name().and_then(|n| n.to_str()),
            Self::Bytes { filename, .. } => Some(filename),
        }
    }

    /// Returns the size in bytes for buffer requests.
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::Path(_) => None,
            Self::Bytes { data, .. } => Some(data.len() as u64),
        }
    }

    /// Returns the path, if this is a path-based request.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Bytes { .. } => None,
        }
    }
}

impl From<PathBuf> for ScanRequest {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ScanRequest {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Reduces an upload name to a safe staging-file suffix.
///
/// Directory components are dropped and anything outside
/// `[A-Za-z0-9._-]` becomes `_`, so a hostile name cannot escape the
/// staging directory.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('.');

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(128)
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
