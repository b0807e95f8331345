use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// URL prefix under which the storage root is served.
pub const PUBLIC_PREFIX: &str = "/uploads/";
const PACKAGE_IMAGE_DIR: &str = "packages";

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        fs::create_dir_all(base_path.join(PACKAGE_IMAGE_DIR)).await?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        if !is_safe_key(key) {
            return Err(AppError::bad_request(format!("Invalid storage key: {}", key)));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Unique key for a package image, keeping the upload's extension.
pub fn package_image_key(original_name: Option<&str>) -> String {
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!(
        "{}/{}-{}{}",
        PACKAGE_IMAGE_DIR,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}

pub fn public_url(key: &str) -> String {
    format!("{}{}", PUBLIC_PREFIX, key)
}

/// Inverse of [`public_url`]; `None` for paths outside the storage root.
pub fn key_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(PUBLIC_PREFIX).filter(|key| is_safe_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_keys_keep_extension_and_are_unique() {
        let a = package_image_key(Some("Beach.JPG"));
        let b = package_image_key(Some("Beach.JPG"));
        assert!(a.starts_with("packages/"));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);

        assert!(!package_image_key(None).contains('.'));
    }

    #[test]
    fn urls_map_back_to_keys() {
        let key = package_image_key(Some("a.png"));
        assert_eq!(key_from_url(&public_url(&key)), Some(key.as_str()));
        assert_eq!(key_from_url("/uploads/../secret"), None);
        assert_eq!(key_from_url("https://cdn.example.com/a.png"), None);
    }

    #[tokio::test]
    async fn upload_and_delete_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .upload("packages/one.png", b"png".to_vec())
            .await
            .unwrap();
        let path = dir.path().join("packages/one.png");
        assert!(path.exists());

        storage.delete("packages/one.png").await.unwrap();
        assert!(!path.exists());

        // Deleting again is not an error
        storage.delete("packages/one.png").await.unwrap();
    }

    #[tokio::test]
    async fn traversal_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        assert!(storage.upload("../escape.png", Vec::new()).await.is_err());
    }
}
