//! Staging files for buffer scans.

use crate::core::sanitize_filename;

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A uniquely named temporary file, removed when dropped.
///
/// Removal runs on every exit path of the owning scope, including early
/// returns, panics and cancellation of the future holding it.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Writes `data` to `<dir>/<uuid>_<filename>`, creating `dir` if needed.
    pub async fn create(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let staged = Self {
            path: dir.join(format!("{}_{}", Uuid::new_v4(), sanitize_filename(filename))),
        };
        tokio::fs::write(&staged.path, data).await?;

        Ok(staged)
    }

    /// Path of the staging file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "Staging file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staging file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_staged_file_lifecycle() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join("nested/temp");

        let path = {
            let staged = StagedFile::create(&staging, "../evil name.exe", b"MZ")
                .await
                .unwrap();
            let path = staged.path().to_path_buf();

            assert_eq!(path.parent(), Some(staging.as_path()));
            assert!(path.to_string_lossy().ends_with("_evil_name.exe"));
            assert_eq!(std::fs::read(&path).unwrap(), b"MZ");
            path
        };

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_staged_names_are_unique() {
        let dir = TempDir::new().unwrap();
        let a = StagedFile::create(dir.path(), "same.txt", b"a").await.unwrap();
        let b = StagedFile::create(dir.path(), "same.txt", b"b").await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_removed_on_panic() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().to_path_buf();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            rt.block_on(async {
                let _staged = StagedFile::create(&staging, "boom.bin", b"x").await.unwrap();
                panic!("scan blew up");
            })
        }));

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
