//! 逐次実行と並列実行の時間比較
//!
//! 各方式の経過時間・逐次版に対する速度向上率・結果の一致を測定する。
//! 結果の表示はgatherが完了した後にだけ行う。

use crate::core::{LabError, LabResult};
use crate::fanout::{evaluate_sequential, FanOutEvaluator, ProcessPool, ThreadPool, WorkerPool};
use crate::fibonacci::{FibAlgorithm, FibonacciCache, FibonacciTask};
use crate::pipeline::{process_text_sequential, text_pipeline, LineFileSink, LineFileSource};
use crate::processing::NoOpProgressReporter;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::{Duration, Instant};

/// 1方式分の計測結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendTiming {
    pub backend: String,
    pub seconds: f64,
    /// 逐次版の時間 / この方式の時間
    pub speedup: f64,
}

impl BackendTiming {
    fn new(backend: &str, seconds: f64, baseline: f64) -> Self {
        Self {
            backend: backend.to_string(),
            seconds,
            speedup: speedup(baseline, seconds),
        }
    }
}

fn speedup(baseline: f64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        baseline / seconds
    } else {
        0.0
    }
}

/// フィボナッチ計算の比較結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FibonacciComparison {
    pub count: usize,
    pub algorithm: FibAlgorithm,
    pub workers: usize,
    pub timings: Vec<BackendTiming>,
    /// 全方式の結果列が一致したか
    pub results_match: bool,
    pub fastest_parallel: Option<String>,
    pub values: Vec<u64>,
}

impl FibonacciComparison {
    /// 性能分析の表
    pub fn render_analysis(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "ANALYSIS ({} values, {})", self.count, self.algorithm.name());
        let _ = writeln!(out, "{}", "=".repeat(70));
        for timing in &self.timings {
            let _ = writeln!(
                out,
                "{:<12} {:>10.4}s (speedup: {:.2}x)",
                timing.backend, timing.seconds, timing.speedup
            );
        }
        let verdict = if self.results_match {
            "all backends produced identical results"
        } else {
            "results differ between backends"
        };
        let _ = writeln!(out, "{verdict}");
        if let Some(fastest) = &self.fastest_parallel {
            let _ = writeln!(out, "fastest parallel backend: {fastest}");
        }
        out
    }
}

/// 逐次・スレッド・プロセスで同じ `F(0..count)` を計算して比較する
///
/// `worker_program` はプロセスプールが起動するバイナリ（`worker` サブコマンドを持つもの）。
/// `deadline` は並列方式それぞれのgatherに適用する。
pub async fn compare_fibonacci(
    count: usize,
    algorithm: FibAlgorithm,
    workers: usize,
    worker_program: &Path,
    deadline: Option<Duration>,
) -> LabResult<FibonacciComparison> {
    let task = FibonacciTask::new(algorithm);

    let start = Instant::now();
    let mut cache = FibonacciCache::new();
    let sequential = evaluate_sequential(count, |i| task.compute_cached(&mut cache, i))?;
    let sequential_secs = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let thread_pool = FanOutEvaluator::new(
        ThreadPool::for_task(task, workers)?,
        NoOpProgressReporter::new(),
    )
    .with_deadline(deadline);
    let threaded = thread_pool.evaluate(count).await?;
    let thread_secs = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let process_pool = FanOutEvaluator::new(
        ProcessPool::new(worker_program, task, workers)?,
        NoOpProgressReporter::new(),
    )
    .with_deadline(deadline);
    let processed = process_pool.evaluate(count).await?;
    let process_secs = start.elapsed().as_secs_f64();

    let timings = vec![
        BackendTiming::new("sequential", sequential_secs, sequential_secs),
        BackendTiming::new(thread_pool.pool().backend_name(), thread_secs, sequential_secs),
        BackendTiming::new(process_pool.pool().backend_name(), process_secs, sequential_secs),
    ];
    let fastest_parallel = timings[1..]
        .iter()
        .min_by(|a, b| a.seconds.total_cmp(&b.seconds))
        .map(|timing| timing.backend.clone());

    Ok(FibonacciComparison {
        count,
        algorithm,
        workers,
        timings,
        results_match: sequential == threaded && threaded == processed,
        fastest_parallel,
        values: sequential,
    })
}

/// 3桁区切り
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// 投入順の結果列を `F( i) = value` の表にする
pub fn render_fibonacci_table(title: &str, values: &[u64]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(70));
    for (i, value) in values.iter().enumerate() {
        let _ = writeln!(out, "F({i:2}) = {}", format_thousands(*value));
    }
    out
}

/// テキスト処理の比較結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextComparison {
    pub records: usize,
    pub capacity: usize,
    pub timings: Vec<BackendTiming>,
    /// 逐次版とパイプライン版の出力がバイト単位で一致したか
    pub outputs_match: bool,
}

/// 逐次版とパイプライン版で同じ入力を処理して比較する
///
/// 出力は `out_dir/sequential.txt` と `out_dir/pipeline.txt`。
pub async fn compare_text_processing(
    input: &Path,
    out_dir: &Path,
    capacity: usize,
) -> LabResult<TextComparison> {
    let sequential_out = out_dir.join("sequential.txt");
    let pipeline_out = out_dir.join("pipeline.txt");

    let start = Instant::now();
    let records = process_text_sequential(input, &sequential_out).await?;
    let sequential_secs = start.elapsed().as_secs_f64();

    let start = Instant::now();
    text_pipeline(capacity, NoOpProgressReporter::new())?
        .run(LineFileSource::new(input), LineFileSink::new(&pipeline_out))
        .await?;
    let pipeline_secs = start.elapsed().as_secs_f64();

    let read = |path: &Path| {
        let path = path.to_path_buf();
        async move {
            tokio::fs::read(&path)
                .await
                .map_err(|e| LabError::io(format!("出力ファイル {}", path.display()), e))
        }
    };
    let outputs_match = read(&sequential_out).await? == read(&pipeline_out).await?;

    Ok(TextComparison {
        records,
        capacity,
        timings: vec![
            BackendTiming::new("sequential", sequential_secs, sequential_secs),
            BackendTiming::new("pipeline", pipeline_secs, sequential_secs),
        ],
        outputs_match,
    })
}
