//! 逐次実行と並列実行のベンチマーク
//!
//! フィボナッチのファンアウトとテキストパイプラインを比較する

use anyhow::Result;
use criterion::{criterion_group, criterion_main, Criterion};
use parallel_lab::fanout::{evaluate_sequential, FanOutEvaluator, ThreadPool};
use parallel_lab::fibonacci::{FibAlgorithm, FibonacciTask};
use parallel_lab::pipeline::{process_text_sequential, text_pipeline, LineFileSink, LineFileSource};
use parallel_lab::processing::NoOpProgressReporter;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const FIB_COUNT: usize = 25;

/// F(0..25) の逐次計算とスレッドプール計算
fn benchmark_fibonacci_fanout(c: &mut Criterion) -> Result<()> {
    let mut group = c.benchmark_group("Fibonacci Fan-out");
    group.measurement_time(Duration::from_secs(10));

    let runtime = Runtime::new()?;
    let task = FibonacciTask::new(FibAlgorithm::Recursive);

    group.bench_function("Sequential", |b| {
        b.iter(|| {
            let values = evaluate_sequential(FIB_COUNT, |i| task.compute_index(i));
            std::hint::black_box(values)
        })
    });

    for workers in [2, num_cpus::get().max(1)] {
        group.bench_function(format!("ThreadPool x{workers}"), |b| {
            b.iter(|| {
                let values = runtime.block_on(async {
                    let pool = ThreadPool::for_task(task, workers)?;
                    FanOutEvaluator::new(pool, NoOpProgressReporter::new())
                        .evaluate(FIB_COUNT)
                        .await
                });
                std::hint::black_box(values)
            })
        });
    }

    group.finish();
    Ok(())
}

/// 1万行のテキスト処理: 単一ループと有界パイプライン
fn benchmark_text_processing(c: &mut Criterion) -> Result<()> {
    let mut group = c.benchmark_group("Text Processing");
    group.measurement_time(Duration::from_secs(10));

    let runtime = Runtime::new()?;
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.txt");
    let lines: Vec<String> = (0..10_000).map(|i| format!("  line number {i}  ")).collect();
    std::fs::write(&input, lines.join("\n"))?;
    let output = temp_dir.path().join("output.txt");

    group.bench_function("Sequential", |b| {
        b.iter(|| {
            let written = runtime.block_on(process_text_sequential(&input, &output));
            std::hint::black_box(written)
        })
    });

    for capacity in [1, 100] {
        group.bench_function(format!("Pipeline capacity={capacity}"), |b| {
            b.iter(|| {
                let summary = runtime.block_on(async {
                    text_pipeline(capacity, NoOpProgressReporter::new())?
                        .run(LineFileSource::new(&input), LineFileSink::new(&output))
                        .await
                });
                std::hint::black_box(summary)
            })
        });
    }

    group.finish();
    Ok(())
}

// Wrapper functions to handle Result return type for criterion
fn benchmark_fibonacci_fanout_wrapper(c: &mut Criterion) {
    if let Err(e) = benchmark_fibonacci_fanout(c) {
        panic!("Benchmark failed: {e}");
    }
}

fn benchmark_text_processing_wrapper(c: &mut Criterion) {
    if let Err(e) = benchmark_text_processing(c) {
        panic!("Benchmark failed: {e}");
    }
}

criterion_group!(
    benches,
    benchmark_fibonacci_fanout_wrapper,
    benchmark_text_processing_wrapper
);
criterion_main!(benches);
