// ファンアウト処理で受け渡されるデータ型定義

use serde::{Deserialize, Serialize};
use std::fmt;

/// 失敗したタスクの情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFailure {
    pub index: usize,
    pub message: String,
}

impl IndexedFailure {
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

impl fmt::Display for IndexedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.index, self.message)
    }
}

/// 1タスクの完了結果（インデックス付き）
///
/// 生成後は変更できない。完了順に届いても、インデックスから元の投入位置を復元できる。
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedResult<T> {
    index: usize,
    outcome: Result<T, String>,
}

impl<T> IndexedResult<T> {
    /// 成功結果を作成
    pub fn success(index: usize, value: T) -> Self {
        Self {
            index,
            outcome: Ok(value),
        }
    }

    /// 失敗結果を作成
    pub fn failure(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            outcome: Err(message.into()),
        }
    }

    /// anyhowの結果から作成（エラーはチェーン全体を文字列化）
    pub fn from_result(index: usize, result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Self::success(index, value),
            Err(error) => Self::failure(index, format!("{error:#}")),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn outcome(&self) -> Result<&T, &str> {
        self.outcome.as_ref().map_err(String::as_str)
    }

    pub fn into_outcome(self) -> Result<T, IndexedFailure> {
        let index = self.index;
        self.outcome
            .map_err(|message| IndexedFailure { index, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_result_success() {
        let result = IndexedResult::success(3, 42u64);

        assert_eq!(result.index(), 3);
        assert!(result.is_success());
        assert_eq!(result.outcome(), Ok(&42));
        assert_eq!(result.into_outcome(), Ok(42));
    }

    #[test]
    fn test_indexed_result_failure() {
        let result: IndexedResult<u64> = IndexedResult::failure(7, "overflow");

        assert_eq!(result.index(), 7);
        assert!(!result.is_success());
        assert_eq!(result.outcome(), Err("overflow"));
        assert_eq!(result.into_outcome(), Err(IndexedFailure::new(7, "overflow")));
    }

    #[test]
    fn test_from_result_keeps_error_chain() {
        let error = anyhow::anyhow!("root cause").context("decode failed");
        let result: IndexedResult<()> = IndexedResult::from_result(1, Err(error));

        let message = result.outcome().unwrap_err();
        assert!(message.contains("decode failed"));
        assert!(message.contains("root cause"));
    }

    #[test]
    fn test_indexed_failure_display() {
        let failure = IndexedFailure::new(12, "task panicked");
        assert_eq!(failure.to_string(), "#12: task panicked");
    }
}
