//! Filesystem-based quarantine storage implementation.

use crate::core::{FileHasher, QuarantineError, QuarantineResult};
use crate::quarantine::record::{QuarantineFilter, QuarantineId, QuarantineRecord};
use crate::quarantine::traits::QuarantineStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

const RECORD_SUFFIX: &str = ".record.json";

/// Filesystem-based quarantine storage.
///
/// Quarantined files keep their basename behind a UTC timestamp prefix, and
/// each one gets a JSON sidecar describing where it came from.
///
/// # Directory Structure
///
/// ```text
/// quarantine/
/// ├── 20240315T101502123Z_invoice.pdf
/// └── 20240315T101502123Z_invoice.pdf.record.json
/// ```
///
/// The directory is created on first use.
#[derive(Debug, Clone)]
pub struct FilesystemQuarantine {
    base_path: PathBuf,
    hasher: FileHasher,
}

impl FilesystemQuarantine {
    /// Creates a quarantine rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            hasher: FileHasher::new(),
        }
    }

    /// Returns the quarantine directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the sidecar path for a quarantined file.
    fn record_path(quarantined: &Path) -> PathBuf {
        let mut name = quarantined.as_os_str().to_os_string();
        name.push(RECORD_SUFFIX);
        PathBuf::from(name)
    }

    /// Picks a destination that does not exist yet.
    async fn destination(&self, at: DateTime<Utc>, basename: &str) -> PathBuf {
        let stamp = at.format("%Y%m%dT%H%M%S%3fZ");
        let mut candidate = self.base_path.join(format!("{stamp}_{basename}"));
        let mut n = 1u32;
        while tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            candidate = self.base_path.join(format!("{stamp}_{n}_{basename}"));
            n += 1;
        }
        candidate
    }

    /// Hashes the file before it moves; failure only costs the digest.
    async fn digest(&self, path: &Path) -> Option<crate::core::FileDigest> {
        let hasher = self.hasher.clone();
        let owned = path.to_path_buf();
        match tokio::task::spawn_blocking(move || hasher.hash_file(&owned)).await {
            Ok(Ok(digest)) => Some(digest),
            Ok(Err(e)) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to hash file before quarantine");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Hashing task failed");
                None
            }
        }
    }

    /// Saves a record's metadata next to the quarantined file.
    async fn save_record(&self, record: &QuarantineRecord) -> QuarantineResult<()> {
        let content = serde_json::to_string_pretty(record).map_err(|e| {
            QuarantineError::StoreFailed {
                reason: format!("Failed to serialize record: {}", e),
            }
        })?;

        tokio::fs::write(Self::record_path(&record.quarantined_path), content)
            .await
            .map_err(|e| QuarantineError::StoreFailed {
                reason: format!("Failed to write record: {}", e),
            })
    }
}

/// Moves `from` to `to`, copying across filesystems when a rename cannot.
async fn move_file(from: &Path, to: &Path) -> QuarantineResult<()> {
    let rename_err = match tokio::fs::rename(from, to).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    tracing::debug!(error = %rename_err, "Rename failed, copying instead");

    if let Err(copy_err) = tokio::fs::copy(from, to).await {
        let _ = tokio::fs::remove_file(to).await;
        return Err(QuarantineError::StoreFailed {
            reason: format!("rename failed ({rename_err}); copy failed ({copy_err})"),
        });
    }

    if let Err(e) = tokio::fs::remove_file(from).await {
        let _ = tokio::fs::remove_file(to).await;
        return Err(QuarantineError::StoreFailed {
            reason: format!("copied but could not remove source: {e}"),
        });
    }

    Ok(())
}

#[async_trait]
impl QuarantineStore for FilesystemQuarantine {
    async fn quarantine(&self, path: &Path, reason: &str) -> QuarantineResult<QuarantineRecord> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QuarantineError::SourceNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(QuarantineError::Io(e)),
        };
        if !metadata.is_file() {
            return Err(QuarantineError::InvalidPath {
                path: path.to_path_buf(),
            });
        }

        let original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| QuarantineError::InvalidPath {
                path: path.to_path_buf(),
            })?;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| QuarantineError::StoreFailed {
                reason: format!("Failed to create quarantine directory: {}", e),
            })?;

        let digest = self.digest(path).await;
        let quarantined_at = Utc::now();
        let destination = self.destination(quarantined_at, &original_filename).await;

        move_file(path, &destination).await?;

        let record = QuarantineRecord {
            id: QuarantineId::new(),
            original_path: path.to_path_buf(),
            original_filename,
            quarantined_path: destination,
            digest,
            quarantined_at,
            reason: reason.to_string(),
        };

        // The file is already out of the serving path; a missing sidecar only loses metadata.
        if let Err(e) = self.save_record(&record).await {
            tracing::warn!(quarantine_id = %record.id, error = %e, "Failed to save quarantine record");
        }

        tracing::info!(
            quarantine_id = %record.id,
            destination = %record.quarantined_path.display(),
            "File quarantined"
        );

        Ok(record)
    }

    async fn list(&self, filter: QuarantineFilter) -> QuarantineResult<Vec<QuarantineRecord>> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(QuarantineError::RetrieveFailed {
                    reason: format!("Failed to read quarantine directory: {}", e),
                })
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(RECORD_SUFFIX));
            if !is_record {
                continue;
            }

            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            match serde_json::from_str::<QuarantineRecord>(&content) {
                Ok(record) if filter.matches(&record) => records.push(record),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable quarantine record");
                }
            }
        }

        // Newest first
        records.sort_by(|a, b| b.quarantined_at.cmp(&a.quarantined_at));

        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_quarantine_moves_file_with_timestamp_prefix() {
        let uploads = TempDir::new().unwrap();
        let qdir = TempDir::new().unwrap();
        let source = uploads.path().join("invoice.pdf");
        std::fs::write(&source, b"fake pdf").unwrap();

        let store = FilesystemQuarantine::new(qdir.path().join("quarantine"));
        let record = store.quarantine(&source, "Eicar-Signature").await.unwrap();

        assert!(!source.exists());
        assert!(record.quarantined_path.exists());
        assert_eq!(std::fs::read(&record.quarantined_path).unwrap(), b"fake pdf");

        let name = record
            .quarantined_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.ends_with("_invoice.pdf"));
        assert!(name.chars().next().unwrap().is_ascii_digit());

        let digest = record.digest.as_ref().unwrap();
        assert_eq!(digest.size, 8);
        assert_eq!(digest.blake3, FileHasher::new().hash_bytes(b"fake pdf").blake3);
    }

    #[tokio::test]
    async fn test_quarantine_missing_source() {
        let qdir = TempDir::new().unwrap();
        let store = FilesystemQuarantine::new(qdir.path());

        let err = store
            .quarantine(Path::new("/no/such/upload.exe"), "test")
            .await
            .unwrap_err();
        assert!(matches!(err, QuarantineError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_quarantine_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemQuarantine::new(dir.path().join("q"));

        let err = store.quarantine(dir.path(), "test").await.unwrap_err();
        assert!(matches!(err, QuarantineError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_same_name_does_not_overwrite() {
        let uploads = TempDir::new().unwrap();
        let qdir = TempDir::new().unwrap();
        let store = FilesystemQuarantine::new(qdir.path());

        let mut destinations = Vec::new();
        for content in [b"first".as_slice(), b"second".as_slice()] {
            let source = uploads.path().join("same.txt");
            std::fs::write(&source, content).unwrap();
            destinations.push(store.quarantine(&source, "test").await.unwrap().quarantined_path);
        }

        assert_ne!(destinations[0], destinations[1]);
        assert_eq!(std::fs::read(&destinations[0]).unwrap(), b"first");
        assert_eq!(std::fs::read(&destinations[1]).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_list_reads_records_newest_first() {
        let uploads = TempDir::new().unwrap();
        let qdir = TempDir::new().unwrap();
        let store = FilesystemQuarantine::new(qdir.path());

        assert_eq!(store.count().await.unwrap(), 0);

        for i in 0..3 {
            let source = uploads.path().join(format!("file{i}.bin"));
            std::fs::write(&source, format!("data{i}")).unwrap();
            store.quarantine(&source, "test").await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let all = store.list(QuarantineFilter::new()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].original_filename, "file2.bin");
        assert_eq!(all[2].original_filename, "file0.bin");

        let page = store
            .list(QuarantineFilter::new().with_pagination(1, 1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].original_filename, "file1.bin");

        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemQuarantine::new(dir.path().join("never-created"));
        assert!(store.list(QuarantineFilter::new()).await.unwrap().is_empty());
    }
}
