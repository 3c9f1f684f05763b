use super::{StorageBackend, StorageItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// ローカルファイルシステム用のストレージバックエンド
#[derive(Clone, Debug, Default)]
pub struct LocalStorageBackend;

impl LocalStorageBackend {
    pub fn new() -> Self {
        Self
    }

    fn path_to_storage_item(path: &Path) -> Result<StorageItem> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        let extension = if metadata.is_file() {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_string())
        } else {
            None
        };

        Ok(StorageItem {
            id: path.to_string_lossy().to_string(),
            name,
            size: metadata.len(),
            is_directory: metadata.is_dir(),
            extension,
        })
    }

    fn walk_files(root: PathBuf) -> Result<Vec<StorageItem>> {
        let mut items = Vec::new();
        for entry in WalkDir::new(&root).min_depth(1) {
            let entry =
                entry.with_context(|| format!("Failed to walk directory: {}", root.display()))?;
            if entry.file_type().is_file() {
                if let Ok(item) = Self::path_to_storage_item(entry.path()) {
                    items.push(item);
                }
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    async fn list_items(&self, prefix: &str) -> Result<Vec<StorageItem>> {
        let mut items = Vec::new();

        let mut entries = tokio::fs::read_dir(prefix)
            .await
            .with_context(|| format!("Failed to read directory: {prefix}"))?;

        while let Some(entry) = entries.next_entry().await? {
            if let Ok(item) = Self::path_to_storage_item(&entry.path()) {
                items.push(item);
            }
        }

        Ok(items)
    }

    async fn list_items_recursive(&self, prefix: &str) -> Result<Vec<StorageItem>> {
        // walkdirは同期APIなのでブロッキングスレッドで走査する
        let root = PathBuf::from(prefix);
        tokio::task::spawn_blocking(move || Self::walk_files(root))
            .await
            .context("Failed to join directory walk")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_items() {
        let temp_dir = tempdir().unwrap();
        let temp_path = temp_dir.path();

        std::fs::write(temp_path.join("image1.jpg"), b"dummy").unwrap();
        std::fs::write(temp_path.join("image2.png"), b"dummy").unwrap();
        std::fs::write(temp_path.join("document.txt"), b"dummy").unwrap();
        std::fs::create_dir(temp_path.join("subdir")).unwrap();

        let backend = LocalStorageBackend::new();
        let items = backend
            .list_items(temp_path.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(items.len(), 4);
        assert!(items.iter().any(|i| i.name == "subdir" && i.is_directory));

        let image_files: Vec<_> = items
            .iter()
            .filter(|item| backend.is_image_file(item))
            .collect();
        assert_eq!(image_files.len(), 2);
    }

    #[tokio::test]
    async fn test_list_items_recursive_skips_directories() {
        let temp_dir = tempdir().unwrap();
        let temp_path = temp_dir.path();

        let sub_dir = temp_path.join("subdir");
        std::fs::create_dir(&sub_dir).unwrap();
        std::fs::write(temp_path.join("root.jpg"), b"dummy").unwrap();
        std::fs::write(sub_dir.join("nested.png"), b"dummy").unwrap();

        let backend = LocalStorageBackend::new();
        let items = backend
            .list_items_recursive(temp_path.to_str().unwrap())
            .await
            .unwrap();

        let mut names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["nested.png", "root.jpg"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing");

        let backend = LocalStorageBackend::new();
        assert!(backend.list_items(missing.to_str().unwrap()).await.is_err());
        assert!(backend
            .list_items_recursive(missing.to_str().unwrap())
            .await
            .is_err());
    }
}
