// 実行設定のトレイト定義

use crate::core::{LabError, LabResult};
use crate::pipeline::FailurePolicy;
use std::time::Duration;

/// ファンアウト処理とパイプラインの設定を抽象化するトレイト
pub trait ExecutionConfig: Send + Sync {
    /// ワーカー数（スレッド/プロセス）を取得
    fn worker_count(&self) -> usize;

    /// パイプラインのキュー容量を取得
    fn queue_capacity(&self) -> usize;

    /// 変換ステージ失敗時のポリシーを取得
    fn failure_policy(&self) -> FailurePolicy;

    /// gatherの期限（Noneなら無期限）
    fn gather_deadline(&self) -> Option<Duration>;

    /// 進捗報告を有効にするかどうか
    fn enable_progress_reporting(&self) -> bool;

    /// 設定値の検証
    fn validate(&self) -> LabResult<()> {
        if self.worker_count() == 0 {
            return Err(LabError::configuration("ワーカー数は1以上である必要があります"));
        }
        if self.queue_capacity() == 0 {
            return Err(LabError::configuration("キュー容量は1以上である必要があります"));
        }
        if self.gather_deadline() == Some(Duration::ZERO) {
            return Err(LabError::configuration("gather期限は0より大きい必要があります"));
        }
        Ok(())
    }
}
