use crate::benchmarks::compare_text_processing;
use crate::pipeline::{process_text_file, process_text_sequential, FailurePolicy};
use crate::processing::{ConsoleProgressReporter, DefaultExecutionConfig, ExecutionConfig};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;

/// textコマンドの引数
pub struct TextOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub capacity: Option<usize>,
    pub sequential: bool,
    pub skip_errors: bool,
    pub compare: bool,
}

/// Execute text command
pub async fn execute_text(options: TextOptions, config: &DefaultExecutionConfig) -> Result<()> {
    let mut config = config.clone();
    if let Some(capacity) = options.capacity {
        config = config.with_queue_capacity(capacity);
    }
    if options.skip_errors {
        config = config.with_failure_policy(FailurePolicy::SkipRecord);
    }

    if options.compare {
        tokio::fs::create_dir_all(&options.output)
            .await
            .with_context(|| format!("Failed to create {}", options.output.display()))?;
        let comparison =
            compare_text_processing(&options.input, &options.output, config.queue_capacity())
                .await?;
        for timing in &comparison.timings {
            println!(
                "{:<12} {:>10.4}s (speedup: {:.2}x)",
                timing.backend, timing.seconds, timing.speedup
            );
        }
        println!(
            "📊 Records: {}, outputs identical: {}",
            comparison.records, comparison.outputs_match
        );
        return Ok(());
    }

    let start = Instant::now();
    if options.sequential {
        let written = process_text_sequential(&options.input, &options.output).await?;
        println!("📊 Written: {written}");
    } else {
        let reporter = ConsoleProgressReporter::from_config(&config);
        let summary = process_text_file(&options.input, &options.output, &config, reporter).await?;
        println!(
            "📊 Read: {}, Written: {}, Skipped: {}, Peak buffered: {}/{}",
            summary.records_read,
            summary.records_written,
            summary.skipped,
            summary.peak_buffered(),
            summary.buffer_bound()
        );
    }
    println!(
        "⏱️  Total ({}): {:.4}s",
        if options.sequential { "sequential" } else { "pipeline" },
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
