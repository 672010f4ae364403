//! Filesystem storage for post images.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

const FALLBACK_STEM: &str = "upload";
const STEM_MAX_LEN: usize = 60;

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
}

#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Write `data` under `prefix/` using a collision-free name derived from
    /// the stem of `original_name` and the given `extension`. Returns the path
    /// relative to the storage root, always with `/` separators.
    pub async fn store(
        &self,
        prefix: &str,
        original_name: &str,
        extension: &str,
        data: Bytes,
    ) -> Result<String, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let stored_path = format!(
            "{}/{}",
            prefix.trim_matches('/'),
            sanitize_filename(original_name, extension)
        );
        let absolute = self.resolve(&stored_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&absolute)
            .await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        Ok(stored_path)
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

/// `Small Cat.GIF` stored as `gif` becomes `small-cat-1a2b3c4d.gif`.
fn sanitize_filename(original: &str, extension: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or(FALLBACK_STEM);
    let mut base: String = slugify(stem).chars().take(STEM_MAX_LEN).collect();
    let trimmed_len = base.trim_end_matches('-').len();
    base.truncate(trimmed_len);
    if base.is_empty() {
        base = FALLBACK_STEM.to_string();
    }

    let token = &Uuid::new_v4().simple().to_string()[..8];
    format!("{base}-{token}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_slugged_and_suffixed() {
        let name = sanitize_filename("Small Cat.GIF", "gif");
        assert!(name.starts_with("small-cat-"), "{name}");
        assert!(name.ends_with(".gif"), "{name}");
        assert_eq!(name.len(), "small-cat-".len() + 8 + ".gif".len());
    }

    #[test]
    fn unusable_stems_fall_back() {
        assert!(sanitize_filename("???.png", "png").starts_with("upload-"));
    }

    #[test]
    fn client_extension_is_not_kept() {
        let name = sanitize_filename("pic.html", "gif");
        assert!(name.starts_with("pic-"), "{name}");
        assert!(name.ends_with(".gif"), "{name}");
        assert!(!name.contains("html"), "{name}");
    }

    #[tokio::test]
    async fn store_and_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let stored_path = storage
            .store("posts", "small.gif", "gif", Bytes::from_static(b"GIF89a"))
            .await
            .expect("stored");
        assert!(stored_path.starts_with("posts/small-"));
        assert!(stored_path.ends_with(".gif"));

        let data = storage.read(&stored_path).await.expect("read");
        assert_eq!(data, Bytes::from_static(b"GIF89a"));
        assert!(storage.read("posts/missing.gif").await.is_err());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");
        assert!(matches!(
            storage.read("../secret").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.read("/etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
    }

    #[tokio::test]
    async fn empty_payloads_are_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");
        assert!(matches!(
            storage.store("posts", "a.gif", "gif", Bytes::new()).await,
            Err(UploadStorageError::EmptyPayload)
        ));
    }
}
