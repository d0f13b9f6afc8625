//! On-disk storage for downloaded product images.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shopdb_core::{ImageStore, StoreError};
use uuid::Uuid;

/// Writes image bytes under `root` with random UUID filenames and hands back
/// `{url_prefix}/{filename}` as the public URL.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl DiskImageStore {
    /// `url_prefix` is stored without a trailing slash.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &shopdb_core::AppConfig) -> Self {
        Self::new(config.uploads_dir.clone(), &config.uploads_url_prefix)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a URL produced by [`ImageStore::save_bytes`] back to its file.
    ///
    /// Returns `None` for URLs outside this store's prefix or that would
    /// escape `root`.
    fn path_for_url(&self, stored_url: &str) -> Option<PathBuf> {
        let file_name = stored_url
            .strip_prefix(&self.url_prefix)?
            .strip_prefix('/')?;
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return None;
        }
        Some(self.root.join(file_name))
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save_bytes(
        &self,
        bytes: &[u8],
        suggested_extension: &str,
    ) -> Result<String, StoreError> {
        let extension = suggested_extension.trim_start_matches('.');
        let file_name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{extension}", Uuid::new_v4())
        };

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&file_name), bytes).await?;
        tracing::debug!(file = %file_name, bytes = bytes.len(), "image stored");

        Ok(format!("{}/{file_name}", self.url_prefix))
    }

    async fn discard(&self, stored_url: &str) -> Result<(), StoreError> {
        let Some(path) = self.path_for_url(stored_url) else {
            return Err(StoreError::Conflict(format!(
                "{stored_url} is not managed by this image store"
            )));
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_writes_file_and_returns_prefixed_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().join("uploads"), "/uploads/");

        let url = store.save_bytes(b"\x89PNG", "png").await.unwrap();

        assert!(url.starts_with("/uploads/"), "got {url}");
        assert!(url.ends_with(".png"));
        let file_name = url.trim_start_matches("/uploads/");
        let written = std::fs::read(dir.path().join("uploads").join(file_name)).unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn each_save_gets_a_distinct_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path(), "/uploads");
        let a = store.save_bytes(b"a", "webp").await.unwrap();
        let b = store.save_bytes(b"a", "webp").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn discard_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path(), "/uploads");
        let url = store.save_bytes(b"x", "jpeg").await.unwrap();

        store.discard(&url).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        store.discard(&url).await.unwrap();
    }

    #[tokio::test]
    async fn discard_rejects_foreign_or_traversing_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path(), "/uploads");
        assert!(store.discard("/elsewhere/a.png").await.is_err());
        assert!(store.discard("/uploads/../secret").await.is_err());
    }
}
