// FanOutEvaluator - submit_all → gather の高レベルAPI

use super::batch::PendingBatch;
use super::WorkerPool;
use crate::core::{LabError, LabResult};
use crate::processing::{ExecutionConfig, ProgressReporter};
use std::sync::Arc;
use std::time::Duration;

/// ワーカープールと進捗報告を束ねた評価器
///
/// バックエンドを差し替えても外部契約（順序・結果）は変わらない。
pub struct FanOutEvaluator<P, R> {
    pool: P,
    reporter: Arc<R>,
    deadline: Option<Duration>,
}

impl<P, R> FanOutEvaluator<P, R>
where
    P: WorkerPool,
    R: ProgressReporter + 'static,
{
    pub fn new(pool: P, reporter: R) -> Self {
        Self {
            pool,
            reporter: Arc::new(reporter),
            deadline: None,
        }
    }

    /// 設定からgatherの期限を引き継ぐ
    pub fn from_config<C: ExecutionConfig + ?Sized>(pool: P, reporter: R, config: &C) -> Self {
        Self::new(pool, reporter).with_deadline(config.gather_deadline())
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn reporter(&self) -> &R {
        self.reporter.as_ref()
    }

    pub fn submit_all(&self, count: usize) -> LabResult<PendingBatch<P::Output>> {
        self.pool.submit_all(count)
    }

    /// 期限が設定されていればgather_with_deadlineを使う
    pub async fn gather(&self, batch: PendingBatch<P::Output>) -> LabResult<Vec<P::Output>> {
        match self.deadline {
            Some(deadline) => batch.gather_with_deadline(self.reporter.as_ref(), deadline).await,
            None => batch.gather(self.reporter.as_ref()).await,
        }
    }

    /// `[f(0), ..., f(count-1)]` を投入順で返す
    pub async fn evaluate(&self, count: usize) -> LabResult<Vec<P::Output>> {
        self.reporter.report_started(count).await;

        let batch = self.submit_all(count)?;
        let result = self.gather(batch).await;

        let failed = match &result {
            Ok(_) => 0,
            Err(LabError::Timeout { outstanding, .. }) => *outstanding,
            Err(error) => error.failed_indices().len().max(1),
        };
        self.reporter
            .report_completed(count.saturating_sub(failed), failed)
            .await;
        result
    }
}
