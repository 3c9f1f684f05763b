// Producer - インデックス配信機能

use crate::core::LabResult;
use tokio::sync::mpsc;

/// Producer: バッチのインデックス 0..count を順に配信
pub fn spawn_index_producer(
    count: usize,
    work_tx: mpsc::Sender<usize>,
) -> tokio::task::JoinHandle<LabResult<()>> {
    tokio::spawn(async move {
        for index in 0..count {
            if (work_tx.send(index).await).is_err() {
                // 全ワーカーが終了済み。未配信分はgather側で未到着として扱う
                break;
            }
        }
        // work_txをドロップしてチャンネル終了シグナル
        Ok(())
    })
}
