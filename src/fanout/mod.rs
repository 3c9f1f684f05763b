// ファンアウト/ギャザー評価器
//
// N個の独立したタスクをワーカープールへ投入し（submit_all）、完了順に届く
// 結果をバッファしてから投入順に並べ直す（gather）。
// 完了順のまま結果を消費する公開APIは提供しない。

pub mod batch;
pub mod buffer;
pub mod evaluator;
pub mod process_pool;
mod producer;
pub mod sequential;
pub mod thread_pool;
pub mod worker;

use crate::core::LabResult;

/// 差し替え可能なワーカープール
///
/// どのバックエンドでも `gather(submit_all(n))` は `[f(0), ..., f(n-1)]` になる。
pub trait WorkerPool: Send + Sync {
    type Output: Send + 'static;

    /// "thread" / "process" など
    fn backend_name(&self) -> &'static str;

    /// 最大同時実行数（実際に起動するのは min(N, worker_count)）
    fn worker_count(&self) -> usize;

    /// インデックス 0..count のタスクを全て投入する
    ///
    /// count == 0 のときはワーカーを起動しない。
    fn submit_all(&self, count: usize) -> LabResult<batch::PendingBatch<Self::Output>>;
}

// 公開API
pub use batch::PendingBatch;
pub use buffer::ResultBuffer;
pub use evaluator::FanOutEvaluator;
pub use process_pool::ProcessPool;
pub use sequential::evaluate_sequential;
pub use thread_pool::ThreadPool;
pub use worker::{serve_worker, RemoteTask, WorkerReply, WorkerRequest};
