// 逐次評価 - 並列版と結果を比較するための基準実装

use crate::core::{IndexedFailure, LabError, LabResult};

/// `for i in 0..count: f(i)` をそのまま実行する
///
/// 並列バックエンドと同じく、失敗は全て集めてから1つのTaskFailureとして返す。
pub fn evaluate_sequential<T, F>(count: usize, mut f: F) -> LabResult<Vec<T>>
where
    F: FnMut(usize) -> anyhow::Result<T>,
{
    let mut values = Vec::with_capacity(count);
    let mut failures = Vec::new();

    for index in 0..count {
        match f(index) {
            Ok(value) => values.push(value),
            Err(error) => failures.push(IndexedFailure::new(index, format!("{error:#}"))),
        }
    }

    if !failures.is_empty() {
        return Err(LabError::task_failure(failures));
    }
    Ok(values)
}
