use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

pub mod local;

/// ディレクトリ内のエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageItem {
    /// パス
    pub id: String,
    /// ファイル名
    pub name: String,
    pub size: u64,
    pub is_directory: bool,
    /// 拡張子（ファイルのみ）
    pub extension: Option<String>,
}

/// 画像一覧の取得元
#[automock]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// 直下のエントリを列挙する
    async fn list_items(&self, prefix: &str) -> Result<Vec<StorageItem>>;

    /// サブディレクトリも含めて列挙する（ディレクトリ自身は含めない）
    async fn list_items_recursive(&self, prefix: &str) -> Result<Vec<StorageItem>>;

    /// 画像ファイルかどうかを判定
    fn is_image_file(&self, item: &StorageItem) -> bool {
        if item.is_directory {
            return false;
        }

        if let Some(ext) = &item.extension {
            let ext_lower = ext.to_lowercase();
            matches!(
                ext_lower.as_str(),
                "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" | "webp"
            )
        } else {
            false
        }
    }
}
