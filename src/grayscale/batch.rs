// 画像バッチ変換 - 画像単位のドメイン分割

use super::{is_gray_output, GrayscaleConverter};
use crate::core::LabResult;
use crate::fanout::{ThreadPool, WorkerPool};
use crate::processing::ProgressReporter;
use crate::storage::StorageBackend;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedImage {
    pub source: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFailureKind {
    /// ファイルが存在しない
    Missing,
    /// 読み込み・デコード・保存の失敗
    Unreadable,
}

impl ItemFailureKind {
    /// エラーチェーン中のNotFoundを探して分類する
    pub fn classify(error: &anyhow::Error) -> Self {
        let not_found = error.chain().any(|cause| {
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                return io.kind() == std::io::ErrorKind::NotFound;
            }
            matches!(
                cause.downcast_ref::<image::ImageError>(),
                Some(image::ImageError::IoError(io)) if io.kind() == std::io::ErrorKind::NotFound
            )
        });
        if not_found {
            Self::Missing
        } else {
            Self::Unreadable
        }
    }
}

/// 1枚分の失敗（バッチ全体は止めない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub kind: ItemFailureKind,
    pub message: String,
}

/// バッチの結果（どちらも入力順）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub converted: Vec<ConvertedImage>,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn push(&mut self, outcome: Result<ConvertedImage, ItemFailure>) {
        match outcome {
            Ok(converted) => self.converted.push(converted),
            Err(failure) => self.failures.push(failure),
        }
    }
}

fn convert_one<C>(converter: &C, path: &Path) -> Result<ConvertedImage, ItemFailure>
where
    C: GrayscaleConverter + ?Sized,
{
    converter
        .convert(path)
        .map(|output| ConvertedImage {
            source: path.to_path_buf(),
            output,
        })
        .map_err(|error| ItemFailure {
            path: path.to_path_buf(),
            kind: ItemFailureKind::classify(&error),
            message: format!("{error:#}"),
        })
}

async fn report_outcome<R>(
    reporter: &R,
    outcome: &Result<ConvertedImage, ItemFailure>,
    completed: usize,
    total: usize,
) where
    R: ProgressReporter + ?Sized,
{
    if let Err(failure) = outcome {
        reporter
            .report_error(&failure.path.display().to_string(), &failure.message)
            .await;
    }
    reporter.report_progress(completed, total).await;
}

/// 1枚ずつ順に変換する
pub async fn convert_sequential<C, R>(converter: &C, paths: &[PathBuf], reporter: &R) -> BatchReport
where
    C: GrayscaleConverter + ?Sized,
    R: ProgressReporter + ?Sized,
{
    reporter.report_started(paths.len()).await;

    let mut report = BatchReport::default();
    for (i, path) in paths.iter().enumerate() {
        let outcome = convert_one(converter, path);
        report_outcome(reporter, &outcome, i + 1, paths.len()).await;
        report.push(outcome);
    }

    reporter
        .report_completed(report.converted.len(), report.failures.len())
        .await;
    report
}

/// スレッドプールで画像ごとに並列変換する
///
/// 画像単位の失敗はBatchReportに入り、Errになるのはワーカー自体の異常だけ。
pub async fn convert_parallel<C, R>(
    converter: Arc<C>,
    paths: Vec<PathBuf>,
    workers: usize,
    reporter: &R,
) -> LabResult<BatchReport>
where
    C: GrayscaleConverter + 'static,
    R: ProgressReporter + ?Sized,
{
    reporter.report_started(paths.len()).await;

    let total = paths.len();
    let pool = ThreadPool::new(
        move |index| Ok(convert_one(converter.as_ref(), &paths[index])),
        workers,
    )?;

    let outcomes = pool.submit_all(total)?.gather(reporter).await?;

    // 失敗の報告はgather後に入力順で行う
    let mut report = BatchReport::default();
    for outcome in outcomes {
        if let Err(failure) = &outcome {
            reporter
                .report_error(&failure.path.display().to_string(), &failure.message)
                .await;
        }
        report.push(outcome);
    }

    reporter
        .report_completed(report.converted.len(), report.failures.len())
        .await;
    Ok(report)
}

/// ディレクトリ内の変換対象画像（`*_gray.*` は除く）をパス順で返す
pub async fn discover_images<S>(
    storage: &S,
    directory: &str,
    recursive: bool,
) -> anyhow::Result<Vec<PathBuf>>
where
    S: StorageBackend + ?Sized,
{
    let items = if recursive {
        storage.list_items_recursive(directory).await?
    } else {
        storage.list_items(directory).await?
    };

    let mut images: Vec<PathBuf> = items
        .iter()
        .filter(|item| storage.is_image_file(item))
        .map(|item| PathBuf::from(&item.id))
        .filter(|path| !is_gray_output(path))
        .collect();
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grayscale::MockGrayscaleConverter;
    use crate::processing::reporting::MockProgressReporter;
    use crate::processing::NoOpProgressReporter;
    use crate::storage::local::LocalStorageBackend;
    use crate::storage::{MockStorageBackend, StorageItem};

    fn fake_converter() -> MockGrayscaleConverter {
        let mut converter = MockGrayscaleConverter::new();
        converter.expect_convert().returning(|path| {
            if path.to_string_lossy().contains("missing") {
                return Err(anyhow::Error::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such file",
                )));
            }
            if path.to_string_lossy().contains("broken") {
                anyhow::bail!("decode error");
            }
            Ok(crate::grayscale::gray_output_path(path))
        });
        converter
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_sequential_continues_after_failure() {
        let reporter = MockProgressReporter::new();
        let input = paths(&["a.png", "missing.png", "b.png", "broken.png"]);

        let report = convert_sequential(&fake_converter(), &input, &reporter).await;

        assert_eq!(report.total(), 4);
        assert_eq!(
            report.converted.iter().map(|c| c.output.clone()).collect::<Vec<_>>(),
            paths(&["a_gray.png", "b_gray.png"])
        );
        assert_eq!(report.failures[0].kind, ItemFailureKind::Missing);
        assert_eq!(report.failures[1].kind, ItemFailureKind::Unreadable);
        assert_eq!(reporter.errors().len(), 2);
        assert_eq!(reporter.completed(), Some((2, 2)));
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let input = paths(&["a.png", "missing.png", "b.png", "c.png", "broken.png", "d.png"]);

        let sequential =
            convert_sequential(&fake_converter(), &input, &NoOpProgressReporter::new()).await;
        let parallel = convert_parallel(
            Arc::new(fake_converter()),
            input,
            3,
            &NoOpProgressReporter::new(),
        )
        .await
        .unwrap();

        assert_eq!(parallel, sequential);
    }

    #[tokio::test]
    async fn test_parallel_empty_batch() {
        let mut converter = MockGrayscaleConverter::new();
        converter.expect_convert().never();

        let report = convert_parallel(Arc::new(converter), Vec::new(), 4, &NoOpProgressReporter::new())
            .await
            .unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_discover_images_filters_and_sorts() {
        let item = |id: &str, ext: Option<&str>, is_directory: bool| StorageItem {
            id: id.to_string(),
            name: id.rsplit('/').next().unwrap_or(id).to_string(),
            size: 10,
            is_directory,
            extension: ext.map(str::to_string),
        };
        let listing = vec![
            item("photos/zebra.jpg", Some("jpg"), false),
            item("photos/cat_gray.png", Some("png"), false),
            item("photos/notes.txt", Some("txt"), false),
            item("photos/album", None, true),
            item("photos/cat.png", Some("png"), false),
        ];

        let mut storage = MockStorageBackend::new();
        storage
            .expect_is_image_file()
            .returning(|item| LocalStorageBackend::new().is_image_file(item));
        storage
            .expect_list_items()
            .returning(move |_| Ok(listing.clone()));

        let images = discover_images(&storage, "photos", false).await.unwrap();
        assert_eq!(images, paths(&["photos/cat.png", "photos/zebra.jpg"]));
    }

    #[tokio::test]
    async fn test_discover_images_recursive_uses_recursive_listing() {
        let mut storage = MockStorageBackend::new();
        storage
            .expect_is_image_file()
            .returning(|item| LocalStorageBackend::new().is_image_file(item));
        storage.expect_list_items().never();
        storage.expect_list_items_recursive().returning(|_| {
            Ok(vec![StorageItem {
                id: "photos/nested/owl.webp".to_string(),
                name: "owl.webp".to_string(),
                size: 10,
                is_directory: false,
                extension: Some("webp".to_string()),
            }])
        });

        let images = discover_images(&storage, "photos", true).await.unwrap();
        assert_eq!(images, paths(&["photos/nested/owl.webp"]));
    }

    #[test]
    fn test_classify_image_not_found() {
        let error = anyhow::Error::new(image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        )))
        .context("Failed to open image");
        assert_eq!(ItemFailureKind::classify(&error), ItemFailureKind::Missing);

        let other = anyhow::anyhow!("bad header");
        assert_eq!(ItemFailureKind::classify(&other), ItemFailureKind::Unreadable);
    }
}
