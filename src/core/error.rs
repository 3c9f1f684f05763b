// ファンアウト処理とパイプライン共通のエラー型定義

use super::types::IndexedFailure;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// parallel_lab全体のエラー型
#[derive(Error, Debug)]
pub enum LabError {
    #[error("タスク失敗: {}件 (最初の失敗 {})", failures.len(), first_failure(failures))]
    TaskFailure { failures: Vec<IndexedFailure> },

    #[error("タイムアウト: {deadline:?} 以内に完了しませんでした (未完了 {outstanding}件)")]
    Timeout { deadline: Duration, outstanding: usize },

    #[error("入力元を開けません: {} - {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("出力先への書き込みエラー: {} - {source}", path.display())]
    SinkWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ステージエラー: {stage} (レコード #{record}) - {message}")]
    StageFailure {
        stage: String,
        record: usize,
        message: String,
    },

    #[error("ワーカープロセスエラー: worker {worker_id} - {message}")]
    WorkerProcess { worker_id: usize, message: String },

    #[error("ワーカープロトコルエラー: {message}")]
    WorkerProtocol { message: String },

    #[error("設定エラー: {message}")]
    ConfigurationError { message: String },

    #[error("タスク結合エラー: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("I/Oエラー: {context} - {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn first_failure(failures: &[IndexedFailure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "なし".to_string())
}

impl LabError {
    /// タスク失敗エラーの作成（インデックス順に並べ替える）
    pub fn task_failure(mut failures: Vec<IndexedFailure>) -> Self {
        failures.sort_by_key(|failure| failure.index);
        Self::TaskFailure { failures }
    }

    /// タイムアウトエラーの作成
    pub fn timeout(deadline: Duration, outstanding: usize) -> Self {
        Self::Timeout {
            deadline,
            outstanding,
        }
    }

    /// 入力元エラーの作成
    pub fn source_unavailable(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 出力先エラーの作成
    pub fn sink_write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::SinkWriteFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// ステージエラーの作成
    pub fn stage(stage: impl Into<String>, record: usize, message: impl Into<String>) -> Self {
        Self::StageFailure {
            stage: stage.into(),
            record,
            message: message.into(),
        }
    }

    /// ワーカープロセスエラーの作成
    pub fn worker_process(worker_id: usize, message: impl Into<String>) -> Self {
        Self::WorkerProcess {
            worker_id,
            message: message.into(),
        }
    }

    /// ワーカープロトコルエラーの作成
    pub fn worker_protocol(message: impl Into<String>) -> Self {
        Self::WorkerProtocol {
            message: message.into(),
        }
    }

    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// タスク結合エラーの作成
    pub fn task_join(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }

    /// I/Oエラーの作成
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// 失敗したインデックス一覧（TaskFailure以外は空）
    pub fn failed_indices(&self) -> Vec<usize> {
        match self {
            Self::TaskFailure { failures } => failures.iter().map(|f| f.index).collect(),
            _ => Vec::new(),
        }
    }

    /// 実行全体を打ち切る構造的なエラーかどうか
    ///
    /// 個々の作業単位の失敗（タスク・ステージ）は構造的ではない。
    pub fn is_structural(&self) -> bool {
        match self {
            Self::TaskFailure { .. } | Self::StageFailure { .. } => false,
            Self::Timeout { .. }
            | Self::SourceUnavailable { .. }
            | Self::SinkWriteFailure { .. }
            | Self::WorkerProcess { .. }
            | Self::WorkerProtocol { .. }
            | Self::ConfigurationError { .. }
            | Self::TaskJoin { .. }
            | Self::Io { .. } => true,
        }
    }
}

impl From<tokio::task::JoinError> for LabError {
    fn from(error: tokio::task::JoinError) -> Self {
        LabError::TaskJoin { source: error }
    }
}

/// parallel_labの結果型
pub type LabResult<T> = std::result::Result<T, LabError>;
