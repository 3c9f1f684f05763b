// PendingBatch - 投入済みタスクの集合とgather

use super::buffer::ResultBuffer;
use crate::core::{IndexedResult, LabError, LabResult};
use crate::processing::ProgressReporter;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// submit_allが返す未解決タスクの集合
///
/// 結果は完了順にチャンネルへ届く。gatherが全件をバッファし、全ワーカーの
/// 終了を待ってから投入順に並べ直す。
pub struct PendingBatch<T> {
    expected: usize,
    results: mpsc::Receiver<IndexedResult<T>>,
    handles: Vec<JoinHandle<LabResult<()>>>,
}

impl<T: Send + 'static> PendingBatch<T> {
    /// results の送信側は全てワーカーが所有していること（全ワーカー終了でチャンネルが閉じる）
    pub fn new(
        expected: usize,
        results: mpsc::Receiver<IndexedResult<T>>,
        handles: Vec<JoinHandle<LabResult<()>>>,
    ) -> Self {
        Self {
            expected,
            results,
            handles,
        }
    }

    /// バッチのタスク数
    pub fn len(&self) -> usize {
        self.expected
    }

    pub fn is_empty(&self) -> bool {
        self.expected == 0
    }

    /// 起動済みの並行ユニット数（ワーカー＋Producer）
    pub fn spawned_units(&self) -> usize {
        self.handles.len()
    }

    /// 全タスクの完了を待ち、投入順の結果列を返す
    pub async fn gather<R>(self, reporter: &R) -> LabResult<Vec<T>>
    where
        R: ProgressReporter + ?Sized,
    {
        self.collect(reporter, None).await
    }

    /// 期限付きgather
    ///
    /// 期限切れの場合は未完了のワーカーを中断し（子プロセスはkillされる）、Timeoutを返す。
    pub async fn gather_with_deadline<R>(self, reporter: &R, deadline: Duration) -> LabResult<Vec<T>>
    where
        R: ProgressReporter + ?Sized,
    {
        self.collect(reporter, Some(deadline)).await
    }

    async fn collect<R>(mut self, reporter: &R, deadline: Option<Duration>) -> LabResult<Vec<T>>
    where
        R: ProgressReporter + ?Sized,
    {
        let mut buffer = ResultBuffer::new(self.expected);
        let mut protocol_errors = Vec::new();

        let drain = drain_results(&mut self.results, &mut buffer, &mut protocol_errors, reporter);
        match deadline {
            Some(deadline) => {
                let timed_out = tokio::time::timeout(deadline, drain).await.is_err();
                if timed_out {
                    let outstanding = buffer.remaining();
                    self.cancel().await;
                    return Err(LabError::timeout(deadline, outstanding));
                }
            }
            None => drain.await,
        }

        // 結果チャンネルが閉じた = 全ワーカーが送信側を手放した。残りを結合する
        let mut worker_errors = Vec::new();
        for handle in self.handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => worker_errors.push(error),
                Err(join_error) => worker_errors.push(LabError::task_join(join_error)),
            }
        }
        for error in &worker_errors {
            reporter.report_error("worker", &error.to_string()).await;
        }

        let ordered = buffer.into_ordered()?;
        match protocol_errors.into_iter().chain(worker_errors).next() {
            Some(error) => Err(error),
            None => Ok(ordered),
        }
    }

    async fn cancel(self) {
        for handle in &self.handles {
            handle.abort();
        }
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn drain_results<T, R>(
    results: &mut mpsc::Receiver<IndexedResult<T>>,
    buffer: &mut ResultBuffer<T>,
    protocol_errors: &mut Vec<LabError>,
    reporter: &R,
) where
    R: ProgressReporter + ?Sized,
{
    while let Some(result) = results.recv().await {
        if let Err(message) = result.outcome() {
            reporter
                .report_error(&format!("task #{}", result.index()), message)
                .await;
        }
        match buffer.insert(result) {
            Ok(()) => {
                reporter
                    .report_progress(buffer.resolved(), buffer.expected())
                    .await
            }
            Err(error) => protocol_errors.push(error),
        }
    }
}
