use crate::grayscale::{
    convert_parallel, convert_sequential, discover_images, BatchReport, GrayscaleConverter,
    ImageGrayscaleConverter,
};
use crate::processing::{ConsoleProgressReporter, DefaultExecutionConfig, ExecutionConfig};
use crate::storage::local::LocalStorageBackend;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// grayscaleコマンドの引数
pub struct GrayscaleOptions {
    pub directory: PathBuf,
    pub sequential: bool,
    pub workers: Option<usize>,
    pub recursive: bool,
}

/// Execute grayscale command
pub async fn execute_grayscale(
    options: GrayscaleOptions,
    config: &DefaultExecutionConfig,
) -> Result<()> {
    if !options.directory.is_dir() {
        anyhow::bail!(
            "Target path is not a directory: {}",
            options.directory.display()
        );
    }

    let storage = LocalStorageBackend::new();
    let images = discover_images(
        &storage,
        &options.directory.to_string_lossy(),
        options.recursive,
    )
    .await?;
    println!("🖼️  Images found: {}", images.len());

    let converter = Arc::new(ImageGrayscaleConverter::new());
    println!("🎨 Converter: {}", converter.converter_name());

    let reporter = ConsoleProgressReporter::from_config(config);
    let start = Instant::now();
    let report = if options.sequential {
        convert_sequential(converter.as_ref(), &images, &reporter).await
    } else {
        // 既定のワーカー数は min(CPU数, 画像数)
        let workers = options.workers.unwrap_or_else(|| config.worker_count());
        convert_parallel(Arc::clone(&converter), images, workers, &reporter).await?
    };
    let elapsed = start.elapsed();

    print_report(&report);
    println!(
        "⏱️  Total ({}): {:.2}s",
        if options.sequential { "sequential" } else { "parallel" },
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn print_report(report: &BatchReport) {
    for converted in &report.converted {
        println!(
            "  {} -> {}",
            converted.source.display(),
            converted.output.display()
        );
    }
    for failure in &report.failures {
        println!(
            "  ⚠️  {} ({:?}): {}",
            failure.path.display(),
            failure.kind,
            failure.message
        );
    }
    println!(
        "📊 Converted: {}, Failed: {}",
        report.converted.len(),
        report.failures.len()
    );
}
