// プロセスプール - 独立したメモリ空間の子プロセスでタスクを実行

use super::batch::PendingBatch;
use super::producer::spawn_index_producer;
use super::worker::{write_json_line, RemoteTask, WorkerReply, WorkerRequest};
use super::WorkerPool;
use crate::core::{IndexedResult, LabError, LabResult};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;

/// プロセスバックエンドのワーカープール
///
/// `program worker <KIND>` を子プロセスとして起動し、stdin/stdout上の
/// JSON-linesでタスクをやり取りする。子プロセスは1件ずつ処理する。
/// PendingBatchが破棄・中断されると子プロセスはkillされる。
pub struct ProcessPool<T: RemoteTask> {
    program: PathBuf,
    args: Vec<String>,
    task: T,
    workers: usize,
}

impl<T: RemoteTask> ProcessPool<T> {
    pub fn new(program: impl Into<PathBuf>, task: T, workers: usize) -> LabResult<Self> {
        if workers == 0 {
            return Err(LabError::configuration(
                "ワーカー数は1以上である必要があります",
            ));
        }
        Ok(Self {
            program: program.into(),
            args: vec!["worker".to_string(), T::KIND.to_string()],
            task,
            workers,
        })
    }

    /// 実行中のバイナリ自身をワーカーとして使う
    pub fn current_exe(task: T, workers: usize) -> LabResult<Self> {
        let program = std::env::current_exe()
            .map_err(|e| LabError::io("実行ファイルのパス取得", e))?;
        Self::new(program, task, workers)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn_child(&self, worker_id: usize) -> LabResult<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LabError::worker_process(
                    worker_id,
                    format!("{} の起動に失敗: {e}", self.program.display()),
                )
            })
    }
}

impl<T: RemoteTask> WorkerPool for ProcessPool<T> {
    type Output = T::Output;

    fn backend_name(&self) -> &'static str {
        "process"
    }

    fn worker_count(&self) -> usize {
        self.workers
    }

    fn submit_all(&self, count: usize) -> LabResult<PendingBatch<T::Output>> {
        let (result_tx, result_rx) = mpsc::channel(count.max(1));
        if count == 0 {
            return Ok(PendingBatch::new(0, result_rx, Vec::new()));
        }

        // 全ワーカーを先に起動する。途中で失敗したら起動済みの子はdropでkillされる
        let worker_count = self.workers.min(count);
        let children = (0..worker_count)
            .map(|worker_id| self.spawn_child(worker_id))
            .collect::<LabResult<Vec<_>>>()?;

        let (work_tx, work_rx) = mpsc::channel::<usize>(worker_count);
        let work_rx = Arc::new(tokio::sync::Mutex::new(work_rx));
        let task = Arc::new(self.task.clone());

        let mut handles = Vec::with_capacity(worker_count + 1);
        handles.push(spawn_index_producer(count, work_tx));
        for (worker_id, child) in children.into_iter().enumerate() {
            handles.push(tokio::spawn(drive_worker_process(
                worker_id,
                child,
                Arc::clone(&task),
                Arc::clone(&work_rx),
                result_tx.clone(),
            )));
        }

        Ok(PendingBatch::new(count, result_rx, handles))
    }
}

/// 親プロセス側で1つの子プロセスを担当するワーカー
async fn drive_worker_process<T: RemoteTask>(
    worker_id: usize,
    mut child: Child,
    task: Arc<T>,
    work_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<usize>>>,
    result_tx: mpsc::Sender<IndexedResult<T::Output>>,
) -> LabResult<()> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| LabError::worker_process(worker_id, "stdinを取得できません"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| LabError::worker_process(worker_id, "stdoutを取得できません"))?;
    let mut replies = BufReader::new(stdout).lines();

    write_json_line(&mut stdin, task.as_ref())
        .await
        .map_err(|e| LabError::worker_process(worker_id, format!("タスク定義の送信に失敗: {e}")))?;

    loop {
        let index = {
            let mut rx = work_rx.lock().await;
            match rx.recv().await {
                Some(index) => index,
                None => break,
            }
        };

        let reply = match request_one::<T::Output>(&mut stdin, &mut replies, index).await {
            Ok(reply) => reply,
            Err(message) => {
                // このインデックスは失敗として記録し、ワーカー自体も終了する
                let _ = result_tx.send(IndexedResult::failure(index, message.clone())).await;
                return Err(LabError::worker_process(worker_id, message));
            }
        };

        if reply.index() != index {
            let message = format!("インデックス {index} への応答が {} でした", reply.index());
            let _ = result_tx.send(IndexedResult::failure(index, message.clone())).await;
            return Err(LabError::worker_protocol(message));
        }

        if (result_tx.send(reply.into_indexed()).await).is_err() {
            break;
        }
    }

    // stdinを閉じると子プロセスはEOFで終了する
    drop(stdin);
    let status = child
        .wait()
        .await
        .map_err(|e| LabError::worker_process(worker_id, format!("終了待ちに失敗: {e}")))?;
    if !status.success() {
        return Err(LabError::worker_process(
            worker_id,
            format!("異常終了しました ({status})"),
        ));
    }
    Ok(())
}

async fn request_one<O: DeserializeOwned>(
    stdin: &mut ChildStdin,
    replies: &mut Lines<BufReader<ChildStdout>>,
    index: usize,
) -> Result<WorkerReply<O>, String> {
    write_json_line(stdin, &WorkerRequest { index })
        .await
        .map_err(|e| format!("リクエスト送信に失敗: {e}"))?;

    let line = replies
        .next_line()
        .await
        .map_err(|e| format!("応答の読み取りに失敗: {e}"))?
        .ok_or_else(|| "応答の前にワーカープロセスが終了しました".to_string())?;

    serde_json::from_str(&line).map_err(|e| format!("応答の解析に失敗: {e}"))
}
