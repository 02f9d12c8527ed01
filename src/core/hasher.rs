//! BLAKE3 content hashing.
//!
//! Quarantine records carry a content hash so an operator can match a
//! quarantined file against threat-intel feeds or against a later upload of
//! the same bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// BLAKE3 digest of a file plus its length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileDigest {
    /// Lowercase hex BLAKE3 hash.
    pub blake3: String,

    /// Number of bytes hashed.
    pub size: u64,
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blake3:{}", self.blake3)
    }
}

/// Computes [`FileDigest`]s.
///
/// ```rust
/// use scangate::core::FileHasher;
///
/// let digest = FileHasher::new().hash_bytes(b"hello world");
/// assert_eq!(digest.size, 11);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileHasher {
    _private: (),
}

impl FileHasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes an in-memory buffer.
    pub fn hash_bytes(&self, data: &[u8]) -> FileDigest {
        FileDigest {
            blake3: blake3::hash(data).to_hex().to_string(),
            size: data.len() as u64,
        }
    }

    /// Hashes a file on disk without loading it into memory.
    pub fn hash_file(&self, path: &Path) -> std::io::Result<FileDigest> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        self.hash_reader(&mut reader)
    }

    /// Hashes everything a reader yields.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> std::io::Result<FileDigest> {
        let mut hasher = blake3::Hasher::new();
        let mut size = 0u64;

        let mut buffer = [0u8; 64 * 1024];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
            size += bytes_read as u64;
        }

        Ok(FileDigest {
            blake3: hasher.finalize().to_hex().to_string(),
            size,
        })
    }
}
