// スレッドプール - 共有メモリのワーカーでタスクを実行

use super::batch::PendingBatch;
use super::producer::spawn_index_producer;
use super::worker::RemoteTask;
use super::WorkerPool;
use crate::core::{IndexedResult, LabError, LabResult};
use std::sync::Arc;
use tokio::sync::mpsc;

/// ワーカー状態を受け取るタスク関数
type TaskFn<T, S> = dyn Fn(&mut S, usize) -> anyhow::Result<T> + Send + Sync;

/// スレッドバックエンドのワーカープール
///
/// 各ワーカーは共有の作業キューからインデックスを取り出し、
/// ブロッキングスレッド上でタスク関数を実行する。パニックはそのインデックスの
/// 失敗として扱う。
///
/// `S` はワーカーごとの作業領域で、1回のバッチの間そのワーカーの全タスクに渡される。
pub struct ThreadPool<T, S = ()> {
    task: Arc<TaskFn<T, S>>,
    workers: usize,
}

impl<T> ThreadPool<T>
where
    T: Send + 'static,
{
    pub fn new<F>(task: F, workers: usize) -> LabResult<Self>
    where
        F: Fn(usize) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::with_worker_state(move |_, index| task(index), workers)
    }
}

impl<T, S> ThreadPool<T, S>
where
    T: Send + 'static,
    S: Default + Send + 'static,
{
    pub fn with_worker_state<F>(task: F, workers: usize) -> LabResult<Self>
    where
        F: Fn(&mut S, usize) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        if workers == 0 {
            return Err(LabError::configuration(
                "ワーカー数は1以上である必要があります",
            ));
        }
        Ok(Self {
            task: Arc::new(task),
            workers,
        })
    }

    /// プロセスプールと同じタスク定義をスレッドで動かす
    pub fn for_task<R>(task: R, workers: usize) -> LabResult<Self>
    where
        R: RemoteTask<Output = T, WorkerState = S>,
    {
        Self::with_worker_state(move |state, index| task.compute(state, index), workers)
    }
}

impl<T, S> WorkerPool for ThreadPool<T, S>
where
    T: Send + 'static,
    S: Default + Send + 'static,
{
    type Output = T;

    fn backend_name(&self) -> &'static str {
        "thread"
    }

    fn worker_count(&self) -> usize {
        self.workers
    }

    fn submit_all(&self, count: usize) -> LabResult<PendingBatch<T>> {
        let (result_tx, result_rx) = mpsc::channel(count.max(1));
        if count == 0 {
            return Ok(PendingBatch::new(0, result_rx, Vec::new()));
        }

        let worker_count = self.workers.min(count);
        let (work_tx, work_rx) = mpsc::channel::<usize>(worker_count);
        let work_rx = Arc::new(tokio::sync::Mutex::new(work_rx));

        let mut handles = Vec::with_capacity(worker_count + 1);
        handles.push(spawn_index_producer(count, work_tx));
        for _ in 0..worker_count {
            handles.push(spawn_thread_worker(
                Arc::clone(&self.task),
                Arc::clone(&work_rx),
                result_tx.clone(),
            ));
        }

        Ok(PendingBatch::new(count, result_rx, handles))
    }
}

fn spawn_thread_worker<T, S>(
    task: Arc<TaskFn<T, S>>,
    work_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<usize>>>,
    result_tx: mpsc::Sender<IndexedResult<T>>,
) -> tokio::task::JoinHandle<LabResult<()>>
where
    T: Send + 'static,
    S: Default + Send + 'static,
{
    tokio::spawn(async move {
        let mut state = S::default();
        loop {
            // 次のインデックスを取得
            let index = {
                let mut rx = work_rx.lock().await;
                match rx.recv().await {
                    Some(index) => index,
                    None => break,
                }
            };

            // 状態はブロッキングスレッドへ渡して、計算後に受け取り直す
            let task = Arc::clone(&task);
            let blocking = tokio::task::spawn_blocking(move || {
                let outcome = task(&mut state, index);
                (state, outcome)
            });
            let result = match blocking.await {
                Ok((returned, outcome)) => {
                    state = returned;
                    IndexedResult::from_result(index, outcome)
                }
                Err(join_error) => {
                    // パニックしたタスクの状態は失われる
                    state = S::default();
                    IndexedResult::failure(index, format!("タスクがパニックしました: {join_error}"))
                }
            };

            if (result_tx.send(result).await).is_err() {
                // gather側が終了済み
                break;
            }
        }
        Ok(())
    })
}
