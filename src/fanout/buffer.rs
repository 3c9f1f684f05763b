// 結果バッファ - 完了順に届いた結果を保持し、全件揃ってから投入順に並べ直す

use crate::core::{IndexedFailure, IndexedResult, LabError, LabResult};
use std::collections::HashMap;

/// インデックス→結果のマップと「未完了数」カウンタ
///
/// gather側の単一ライターだけが書き込む。順序付きの列に変換できるのは
/// 未完了数が0になった後だけ。
#[derive(Debug)]
pub struct ResultBuffer<T> {
    expected: usize,
    remaining: usize,
    slots: HashMap<usize, Result<T, String>>,
}

impl<T> ResultBuffer<T> {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            remaining: expected,
            slots: HashMap::with_capacity(expected),
        }
    }

    /// 完了した結果を1件格納
    ///
    /// 範囲外・重複したインデックスはプロトコル違反として拒否する。
    pub fn insert(&mut self, result: IndexedResult<T>) -> LabResult<()> {
        let index = result.index();
        if index >= self.expected {
            return Err(LabError::worker_protocol(format!(
                "インデックス {index} はバッチ範囲 0..{} の外です",
                self.expected
            )));
        }
        if self.slots.contains_key(&index) {
            return Err(LabError::worker_protocol(format!(
                "インデックス {index} の結果が重複しています"
            )));
        }

        let outcome = result.into_outcome().map_err(|failure| failure.message);
        self.slots.insert(index, outcome);
        self.remaining -= 1;
        Ok(())
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn resolved(&self) -> usize {
        self.expected - self.remaining
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// これまでに届いた失敗（インデックス順）
    pub fn failures(&self) -> Vec<IndexedFailure> {
        let mut failures: Vec<IndexedFailure> = self
            .slots
            .iter()
            .filter_map(|(index, outcome)| {
                outcome
                    .as_ref()
                    .err()
                    .map(|message| IndexedFailure::new(*index, message.clone()))
            })
            .collect();
        failures.sort_by_key(|failure| failure.index);
        failures
    }

    /// まだ結果が届いていないインデックス
    pub fn missing(&self) -> Vec<usize> {
        (0..self.expected)
            .filter(|index| !self.slots.contains_key(index))
            .collect()
    }

    /// 投入順の列へ変換
    ///
    /// 失敗または未到着のインデックスが1つでもあれば、それら全てを含む
    /// TaskFailureを返す。
    pub fn into_ordered(self) -> LabResult<Vec<T>> {
        let mut failures = self.failures();
        failures.extend(
            self.missing()
                .into_iter()
                .map(|index| IndexedFailure::new(index, "結果が届く前にワーカーが終了しました")),
        );
        if !failures.is_empty() {
            return Err(LabError::task_failure(failures));
        }

        // ここに来た時点で 0..expected の全スロットが成功で埋まっている
        let mut entries: Vec<(usize, Result<T, String>)> = self.slots.into_iter().collect();
        entries.sort_unstable_by_key(|(index, _)| *index);
        Ok(entries
            .into_iter()
            .filter_map(|(_, outcome)| outcome.ok())
            .collect())
    }
}
