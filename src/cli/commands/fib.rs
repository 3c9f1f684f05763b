use crate::benchmarks::{compare_fibonacci, render_fibonacci_table};
use crate::cli::FibBackend;
use crate::fanout::{evaluate_sequential, FanOutEvaluator, ProcessPool, ThreadPool, WorkerPool};
use crate::fibonacci::{FibAlgorithm, FibonacciCache, FibonacciTask};
use crate::processing::{ConsoleProgressReporter, DefaultExecutionConfig, ExecutionConfig};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// fibコマンドの引数
pub struct FibOptions {
    pub count: usize,
    pub algorithm: FibAlgorithm,
    pub backend: FibBackend,
    pub workers: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub json: bool,
}

/// Execute fib command
pub async fn execute_fib(options: FibOptions, config: &DefaultExecutionConfig) -> Result<()> {
    let workers = options.workers.unwrap_or_else(|| config.worker_count());
    let deadline = options
        .deadline_secs
        .map(Duration::from_secs)
        .or_else(|| config.gather_deadline());
    let task = FibonacciTask::new(options.algorithm);

    // JSON出力時はstdoutを汚さないよう進捗を止める
    let reporter = if options.json {
        ConsoleProgressReporter::quiet()
    } else {
        ConsoleProgressReporter::from_config(config)
    };

    let start = Instant::now();
    let values = match options.backend {
        FibBackend::All => return execute_comparison(&options, workers, deadline).await,
        FibBackend::Sequential => {
            let mut cache = FibonacciCache::new();
            evaluate_sequential(options.count, |i| task.compute_cached(&mut cache, i))?
        }
        FibBackend::Thread => {
            let pool = ThreadPool::for_task(task, workers)?;
            run_evaluator(pool, reporter, deadline, options.count).await?
        }
        FibBackend::Process => {
            let pool = ProcessPool::current_exe(task, workers)?;
            run_evaluator(pool, reporter, deadline, options.count).await?
        }
    };
    let elapsed = start.elapsed();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        print!("{}", render_fibonacci_table("Fibonacci", &values));
        println!("⏱️  {:?} backend: {:.4}s", options.backend, elapsed.as_secs_f64());
    }
    Ok(())
}

/// 逐次・スレッド・プロセスの時間比較
async fn execute_comparison(
    options: &FibOptions,
    workers: usize,
    deadline: Option<Duration>,
) -> Result<()> {
    let program = std::env::current_exe().context("Failed to locate the worker binary")?;
    let comparison =
        compare_fibonacci(options.count, options.algorithm, workers, &program, deadline).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        // 表示は全結果がそろった後に投入順で行う
        print!("{}", render_fibonacci_table("Fibonacci", &comparison.values));
        println!();
        print!("{}", comparison.render_analysis());
    }
    Ok(())
}

async fn run_evaluator<P>(
    pool: P,
    reporter: ConsoleProgressReporter,
    deadline: Option<Duration>,
    count: usize,
) -> Result<Vec<P::Output>>
where
    P: WorkerPool,
{
    let evaluator = FanOutEvaluator::new(pool, reporter).with_deadline(deadline);
    Ok(evaluator.evaluate(count).await?)
}
