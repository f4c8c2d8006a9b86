use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::{ObjectStore, StoreError};

/// Objects kept as files below `root`, served by actix-files under `url_prefix`.
pub struct LocalObjectStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        LocalObjectStore {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Only plain relative segments; anything that could escape the root is refused.
    fn resolve(&self, locator: &str) -> Result<PathBuf, StoreError> {
        if locator.is_empty() || locator.contains("://") {
            return Err(StoreError::InvalidLocator(locator.to_string()));
        }
        let mut path = self.root.clone();
        for component in Path::new(locator).components() {
            match component {
                Component::Normal(segment) => path.push(segment),
                _ => return Err(StoreError::InvalidLocator(locator.to_string())),
            }
        }
        Ok(path)
    }

    fn locator_of<'a>(&self, locator_or_url: &'a str) -> &'a str {
        locator_or_url
            .strip_prefix(self.url_prefix.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(locator_or_url)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, bytes: &[u8], path: &str) -> Result<String, StoreError> {
        let locator = path.trim_start_matches('/');
        let target = self.resolve(locator)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        log::debug!("stored object {} ({} bytes)", locator, bytes.len());
        Ok(locator.to_string())
    }

    fn public_url(&self, locator: &str) -> String {
        format!("{}/{}", self.url_prefix, locator)
    }

    async fn delete(&self, locator_or_url: &str) -> Result<(), StoreError> {
        let locator = self.locator_of(locator_or_url);
        let target = self.resolve(locator)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::ObjectNotFound(locator.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_delete_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://127.0.0.1:8000/uploads");

        let locator = store.upload(b"png-bytes", "gallery/1_foto.png").await.unwrap();
        let on_disk = dir.path().join("gallery").join("1_foto.png");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"png-bytes");

        let url = store.public_url(&locator);
        assert_eq!(url, "http://127.0.0.1:8000/uploads/gallery/1_foto.png");
        store.delete(&url).await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn rejects_traversal_and_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://127.0.0.1:8000/uploads");

        assert!(matches!(
            store.upload(b"x", "../escape.png").await,
            Err(StoreError::InvalidLocator(_))
        ));
        assert!(matches!(
            store.delete("https://cdn.example.com/foto.png").await,
            Err(StoreError::InvalidLocator(_))
        ));
    }

    #[tokio::test]
    async fn deleting_missing_object_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "/uploads");
        assert!(matches!(
            store.delete("news/none.png").await,
            Err(StoreError::ObjectNotFound(_))
        ));
    }
}
