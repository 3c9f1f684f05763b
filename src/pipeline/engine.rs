// Pipeline - ステージを有界キューで連結して同時に実行する

use super::queue::{bounded_queue, Message, QueueReceiver, QueueSender};
use super::sink::{LineFileSink, RecordSink};
use super::source::{LineFileSource, RecordSource};
use super::stage::{FailurePolicy, StageReport, StageState, Transform};
use super::transforms::{StripWhitespace, Uppercase};
use crate::core::{LabError, LabResult};
use crate::processing::{ExecutionConfig, ProgressReporter};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// キュー1本の計測結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuePeak {
    pub name: String,
    pub capacity: usize,
    pub peak: usize,
}

/// 実行結果の要約
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub records_read: usize,
    pub records_written: usize,
    pub skipped: usize,
    pub stage_states: Vec<(String, StageState)>,
    pub queues: Vec<QueuePeak>,
}

impl PipelineSummary {
    /// 各キューの最大滞留数の合計（capacity × キュー数 を超えない）
    pub fn peak_buffered(&self) -> usize {
        self.queues.iter().map(|queue| queue.peak).sum()
    }

    pub fn buffer_bound(&self) -> usize {
        self.queues.iter().map(|queue| queue.capacity).sum()
    }
}

/// source → 変換ステージ… → sink のパイプライン
///
/// 各ステージは独立したtokioタスクとして動き、隣り合うステージとは
/// 有界キューだけでつながる。終了はEndOfStreamの伝播で決まる。
pub struct Pipeline<R> {
    capacity: usize,
    policy: FailurePolicy,
    transforms: Vec<Arc<dyn Transform>>,
    reporter: Arc<R>,
}

impl<R: ProgressReporter + 'static> Pipeline<R> {
    pub fn new(capacity: usize, reporter: R) -> LabResult<Self> {
        if capacity == 0 {
            return Err(LabError::configuration(
                "キュー容量は1以上である必要があります",
            ));
        }
        Ok(Self {
            capacity,
            policy: FailurePolicy::default(),
            transforms: Vec::new(),
            reporter: Arc::new(reporter),
        })
    }

    /// 設定のキュー容量と失敗ポリシーを使う
    pub fn from_config<C: ExecutionConfig + ?Sized>(config: &C, reporter: R) -> LabResult<Self> {
        config.validate()?;
        Ok(Self::new(config.queue_capacity(), reporter)?.with_failure_policy(config.failure_policy()))
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 変換ステージを末尾に追加
    pub fn stage<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// source・sinkを含むステージ数
    pub fn stage_count(&self) -> usize {
        self.transforms.len() + 2
    }

    pub fn queue_count(&self) -> usize {
        self.transforms.len() + 1
    }

    /// 全ステージを起動してから全ステージの終了を待つ
    ///
    /// いずれかのステージがエラーで終わった場合、ステージ順で最初のエラーを返す。
    pub async fn run<S, K>(&self, source: S, sink: K) -> LabResult<PipelineSummary>
    where
        S: RecordSource + 'static,
        K: RecordSink + 'static,
    {
        let mut gauges = Vec::with_capacity(self.queue_count());
        let mut handles = Vec::with_capacity(self.stage_count());

        let (source_tx, mut upstream, gauge) = bounded_queue("source", self.capacity)?;
        gauges.push(gauge);
        handles.push(tokio::spawn(run_source(
            source,
            source_tx,
            Arc::clone(&self.reporter),
        )));

        for transform in &self.transforms {
            let (tx, rx, gauge) = bounded_queue(transform.name(), self.capacity)?;
            gauges.push(gauge);
            handles.push(tokio::spawn(run_transform(
                Arc::clone(transform),
                upstream,
                tx,
                self.policy,
                Arc::clone(&self.reporter),
            )));
            upstream = rx;
        }

        handles.push(tokio::spawn(run_sink(
            sink,
            upstream,
            Arc::clone(&self.reporter),
        )));

        // 全ステージの終了を待つ（途中で打ち切らない）
        let mut reports = Vec::with_capacity(handles.len());
        let mut join_error = None;
        for handle in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(error) => {
                    join_error.get_or_insert(LabError::task_join(error));
                }
            }
        }
        if let Some(error) = join_error {
            return Err(error);
        }

        let records_read = reports.first().map_or(0, |report| report.records_out);
        let records_written = reports.last().map_or(0, |report| report.records_out);
        let skipped = reports.iter().map(|report| report.skipped).sum();
        self.reporter
            .report_completed(records_written, records_read.saturating_sub(records_written))
            .await;

        if let Some(error) = reports.iter_mut().find_map(|report| report.error.take()) {
            return Err(error);
        }

        Ok(PipelineSummary {
            records_read,
            records_written,
            skipped,
            stage_states: reports
                .iter()
                .map(|report| (report.name.clone(), report.state))
                .collect(),
            queues: gauges
                .iter()
                .map(|gauge| QueuePeak {
                    name: gauge.name().to_string(),
                    capacity: gauge.capacity(),
                    peak: gauge.peak(),
                })
                .collect(),
        })
    }
}

/// 先頭ステージ: 入力元を読み切るか失敗したらEndOfStreamを流す
async fn run_source<S, R>(mut source: S, output: QueueSender<String>, reporter: Arc<R>) -> StageReport
where
    S: RecordSource,
    R: ProgressReporter + ?Sized,
{
    let mut report = StageReport::new("source");
    report.advance(StageState::Running);

    if let Err(error) = source.open().await {
        reporter.report_error(&source.describe(), &error.to_string()).await;
        report.fail(error);
    } else {
        loop {
            match source.next_record().await {
                Ok(Some(record)) => {
                    report.records_in += 1;
                    if output.push(Message::Payload(record)).await.is_err() {
                        // 下流が打ち切った。EndOfStreamを受け取る相手もいない
                        report.advance(StageState::Terminated);
                        return report;
                    }
                    report.records_out += 1;
                }
                Ok(None) => break,
                Err(error) => {
                    reporter.report_error(&source.describe(), &error.to_string()).await;
                    report.fail(error);
                    break;
                }
            }
        }
    }

    report.advance(StageState::Draining);
    let _ = output.push(Message::EndOfStream).await;
    report.advance(StageState::Terminated);
    report
}

/// 中間ステージ: 1件ずつ変換して到着順に流す
async fn run_transform<R>(
    transform: Arc<dyn Transform>,
    mut input: QueueReceiver<String>,
    output: QueueSender<String>,
    policy: FailurePolicy,
    reporter: Arc<R>,
) -> StageReport
where
    R: ProgressReporter + ?Sized,
{
    let mut report = StageReport::new(transform.name());
    report.advance(StageState::Running);

    loop {
        let record = match input.pop().await {
            Some(Message::Payload(record)) => record,
            Some(Message::EndOfStream) => break,
            None => {
                report.fail(LabError::stage(
                    transform.name(),
                    report.records_in,
                    "EndOfStreamを受け取る前に入力が閉じられました",
                ));
                break;
            }
        };
        report.records_in += 1;

        match transform.apply(record) {
            Ok(transformed) => {
                if output.push(Message::Payload(transformed)).await.is_err() {
                    input.close();
                    report.advance(StageState::Terminated);
                    return report;
                }
                report.records_out += 1;
            }
            Err(error) => {
                let item = format!("{} (レコード #{})", transform.name(), report.records_in);
                reporter.report_error(&item, &format!("{error:#}")).await;
                match policy {
                    FailurePolicy::SkipRecord => report.skipped += 1,
                    FailurePolicy::FailFast => {
                        // 上流は次のpushで停止し、下流はEndOfStreamで終了する
                        input.close();
                        report.fail(LabError::stage(
                            transform.name(),
                            report.records_in,
                            format!("{error:#}"),
                        ));
                        break;
                    }
                }
            }
        }
    }

    report.advance(StageState::Draining);
    let _ = output.push(Message::EndOfStream).await;
    report.advance(StageState::Terminated);
    report
}

/// 末尾ステージ: EndOfStreamまで受け取った順に書き出す
async fn run_sink<K, R>(mut sink: K, mut input: QueueReceiver<String>, reporter: Arc<R>) -> StageReport
where
    K: RecordSink,
    R: ProgressReporter + ?Sized,
{
    let mut report = StageReport::new("sink");
    report.advance(StageState::Running);

    if let Err(error) = sink.open().await {
        reporter.report_error(&sink.describe(), &error.to_string()).await;
        report.fail(error);
        // 入力を閉じて上流を止める
        input.close();
        report.advance(StageState::Terminated);
        return report;
    }

    loop {
        let record = match input.pop().await {
            Some(Message::Payload(record)) => record,
            Some(Message::EndOfStream) => break,
            None => {
                report.fail(LabError::stage(
                    "sink",
                    report.records_in,
                    "EndOfStreamを受け取る前に入力が閉じられました",
                ));
                break;
            }
        };
        report.records_in += 1;

        if let Err(error) = sink.write_record(&record).await {
            reporter.report_error(&sink.describe(), &error.to_string()).await;
            report.fail(error);
            input.close();
            break;
        }
        report.records_out += 1;
    }

    report.advance(StageState::Draining);
    if let Err(error) = sink.close().await {
        reporter.report_error(&sink.describe(), &error.to_string()).await;
        report.fail(error);
    }
    report.advance(StageState::Terminated);
    report
}

/// strip → uppercase のテキストパイプライン
pub fn text_pipeline<R: ProgressReporter + 'static>(
    capacity: usize,
    reporter: R,
) -> LabResult<Pipeline<R>> {
    Ok(Pipeline::new(capacity, reporter)?
        .stage(StripWhitespace)
        .stage(Uppercase))
}

/// 入力ファイルを読み、変換した行を出力ファイルへ書く
pub async fn process_text_file<C, R>(
    input: &Path,
    output: &Path,
    config: &C,
    reporter: R,
) -> LabResult<PipelineSummary>
where
    C: ExecutionConfig + ?Sized,
    R: ProgressReporter + 'static,
{
    let pipeline = Pipeline::from_config(config, reporter)?
        .stage(StripWhitespace)
        .stage(Uppercase);
    pipeline
        .run(LineFileSource::new(input), LineFileSink::new(output))
        .await
}
