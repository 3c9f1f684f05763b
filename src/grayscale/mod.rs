use anyhow::Result;
use mockall::automock;
use std::path::{Path, PathBuf};

pub mod batch;
pub mod standard;

pub use batch::{
    convert_parallel, convert_sequential, discover_images, BatchReport, ConvertedImage,
    ItemFailure, ItemFailureKind,
};
pub use standard::ImageGrayscaleConverter;

/// 変換後のファイル名に付ける接尾辞
pub const GRAY_SUFFIX: &str = "_gray";

/// 画像1枚をグレースケールへ変換するバックエンド
#[automock]
pub trait GrayscaleConverter: Send + Sync {
    /// 変換して書き出し、出力先のパスを返す
    fn convert(&self, source: &Path) -> Result<PathBuf>;

    fn converter_name(&self) -> &'static str {
        "grayscale"
    }
}

/// `<stem>_gray<ext>` を同じディレクトリに作る
pub fn gray_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match source.extension() {
        Some(ext) => format!("{stem}{GRAY_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{GRAY_SUFFIX}"),
    };
    source.with_file_name(file_name)
}

/// 既に変換済みの出力ファイルかどうか
pub fn is_gray_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(GRAY_SUFFIX))
}
