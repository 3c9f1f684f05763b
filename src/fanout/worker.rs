// プロセスワーカー - 子プロセス側のJSON-linesプロトコル
//
// 1行目: タスク定義(JSON)
// 以降  : {"index": i} を1行ずつ受け取り、WorkerReplyを1行ずつ返す
// stdinのEOFで終了する。stdoutはプロトコル専用。

use crate::core::IndexedResult;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// プロセスプールへ送れるタスク
///
/// タスク本体と結果はJSONでプロセス境界を越える。
pub trait RemoteTask: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// workerサブコマンドがタスク型を選ぶための名前
    const KIND: &'static str;

    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// ワーカー1つにつき1つ作られ、そのワーカーが受け持つ全インデックスで共有される
    type WorkerState: Default + Send + 'static;

    fn compute(&self, state: &mut Self::WorkerState, index: usize) -> anyhow::Result<Self::Output>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRequest {
    pub index: usize,
}

/// ワーカーの応答1行
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum WorkerReply<T> {
    Value { index: usize, value: T },
    Failure { index: usize, message: String },
}

impl<T> WorkerReply<T> {
    pub fn from_result(index: usize, result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Value { index, value },
            Err(error) => Self::Failure {
                index,
                message: format!("{error:#}"),
            },
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Value { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    pub fn into_indexed(self) -> IndexedResult<T> {
        match self {
            Self::Value { index, value } => IndexedResult::success(index, value),
            Self::Failure { index, message } => IndexedResult::failure(index, message),
        }
    }
}

/// 値をJSON 1行として書き出してflushする
pub(crate) async fn write_json_line<W, S>(writer: &mut W, value: &S) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    S: Serialize + ?Sized,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

/// 子プロセス側のメインループ
///
/// 処理したリクエスト数を返す。タスクの失敗はFailure応答として返し、
/// プロトコル違反（壊れた行など）だけをエラーにする。
pub async fn serve_worker<T, R, W>(input: R, mut output: W) -> anyhow::Result<usize>
where
    T: RemoteTask,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let header = lines
        .next_line()
        .await?
        .context("タスク定義の行がありません")?;
    let task: T = serde_json::from_str(&header)
        .with_context(|| format!("{} タスク定義の解析に失敗", T::KIND))?;

    let mut state = <T::WorkerState>::default();
    let mut served = 0;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: WorkerRequest = serde_json::from_str(&line)
            .with_context(|| format!("リクエストの解析に失敗: {line}"))?;

        // 専用プロセスなのでランタイムスレッド上で直接計算してよい
        let reply = WorkerReply::from_result(request.index, task.compute(&mut state, request.index));
        write_json_line(&mut output, &reply).await?;
        served += 1;
    }

    output.flush().await?;
    Ok(served)
}
