// 進捗報告のトレイト定義

/// 進捗報告を抽象化するトレイト
///
/// 値そのものは渡さない。完了順の件数とエラーだけを報告する。
#[async_trait::async_trait]
pub trait ProgressReporter: Send + Sync {
    /// 処理開始時の報告
    async fn report_started(&self, total_items: usize);

    /// 進捗状況の報告
    async fn report_progress(&self, completed: usize, total: usize);

    /// エラー発生時の報告
    async fn report_error(&self, item: &str, error: &str);

    /// 処理完了時の報告
    async fn report_completed(&self, succeeded: usize, failed: usize);
}
