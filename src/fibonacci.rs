//! フィボナッチ数の計算
//!
//! 3つの計算方法を提供する。バッチ内の各インデックスは互いに独立しているので
//! ファンアウトで並列化できるが、反復版のループは前の値に依存するため並列化できない。

use crate::fanout::RemoteTask;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// u64で表せる最大のインデックス（F(93) = 12200160415121876738）
pub const MAX_U64_INDEX: u32 = 93;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FibonacciError {
    #[error("F({index}) はu64の範囲を超えます (最大 F({MAX_U64_INDEX}))")]
    Overflow { index: u32 },
}

fn check_range(n: u32) -> Result<(), FibonacciError> {
    if n > MAX_U64_INDEX {
        return Err(FibonacciError::Overflow { index: n });
    }
    Ok(())
}

/// 純粋な再帰版（指数時間、CPU負荷用）
pub fn fibonacci_recursive(n: u32) -> Result<u64, FibonacciError> {
    fn fib(n: u32) -> u64 {
        if n <= 1 {
            return n as u64;
        }
        fib(n - 1) + fib(n - 2)
    }

    check_range(n)?;
    Ok(fib(n))
}

/// 反復版
pub fn fibonacci_iterative(n: u32) -> Result<u64, FibonacciError> {
    check_range(n)?;
    if n <= 1 {
        return Ok(n as u64);
    }

    // 各反復が前の反復の結果に依存する
    let (mut prev, mut curr) = (0u64, 1u64);
    for _ in 2..=n {
        (prev, curr) = (curr, prev + curr);
    }
    Ok(curr)
}

/// メモ化再帰のキャッシュ
///
/// 呼び出し側が所有し、寿命も呼び出し側が決める（1バッチ・1ワーカーなど）。
#[derive(Debug, Clone, Default)]
pub struct FibonacciCache {
    memo: HashMap<u32, u64>,
}

impl FibonacciCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, n: u32) -> Result<u64, FibonacciError> {
        check_range(n)?;
        Ok(self.lookup(n))
    }

    fn lookup(&mut self, n: u32) -> u64 {
        if n <= 1 {
            return n as u64;
        }
        if let Some(&value) = self.memo.get(&n) {
            return value;
        }
        let value = self.lookup(n - 1) + self.lookup(n - 2);
        self.memo.insert(n, value);
        value
    }

    /// キャッシュ済みのエントリ数
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }
}

/// 計算方法
#[derive(clap::ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FibAlgorithm {
    #[default]
    Recursive,
    Iterative,
    Memoized,
}

impl FibAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Iterative => "iterative",
            Self::Memoized => "memoized",
        }
    }

    /// 呼び出し側のキャッシュを使う計算（メモ化版以外はキャッシュに触れない）
    pub fn compute(self, cache: &mut FibonacciCache, n: u32) -> Result<u64, FibonacciError> {
        match self {
            Self::Recursive => fibonacci_recursive(n),
            Self::Iterative => fibonacci_iterative(n),
            Self::Memoized => cache.get(n),
        }
    }
}

/// インデックスiに対してF(i)を計算するタスク
///
/// プロセスプールへシリアライズして送れる。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibonacciTask {
    pub algorithm: FibAlgorithm,
}

impl FibonacciTask {
    pub fn new(algorithm: FibAlgorithm) -> Self {
        Self { algorithm }
    }

    /// キャッシュを共有しない単発計算
    pub fn compute_index(&self, index: usize) -> anyhow::Result<u64> {
        self.compute_cached(&mut FibonacciCache::new(), index)
    }

    /// ワーカーやバッチが持つキャッシュを再利用して計算する
    pub fn compute_cached(&self, cache: &mut FibonacciCache, index: usize) -> anyhow::Result<u64> {
        let n = u32::try_from(index)
            .map_err(|_| FibonacciError::Overflow { index: u32::MAX })?;
        Ok(self.algorithm.compute(cache, n)?)
    }
}

impl RemoteTask for FibonacciTask {
    const KIND: &'static str = "fibonacci";
    type Output = u64;
    type WorkerState = FibonacciCache;

    fn compute(&self, cache: &mut FibonacciCache, index: usize) -> anyhow::Result<u64> {
        self.compute_cached(cache, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_TWENTY: [u64; 20] = [
        0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610, 987, 1597, 2584, 4181,
    ];

    #[test]
    fn test_all_algorithms_agree_on_first_twenty() {
        for (n, expected) in FIRST_TWENTY.iter().enumerate() {
            let n = n as u32;
            assert_eq!(fibonacci_recursive(n), Ok(*expected));
            assert_eq!(fibonacci_iterative(n), Ok(*expected));
            assert_eq!(FibonacciCache::new().get(n), Ok(*expected));
        }
    }

    #[test]
    fn test_largest_u64_value() {
        assert_eq!(fibonacci_iterative(93), Ok(12_200_160_415_121_876_738));
        assert_eq!(FibonacciCache::new().get(93), Ok(12_200_160_415_121_876_738));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(
            fibonacci_iterative(94),
            Err(FibonacciError::Overflow { index: 94 })
        );
        assert_eq!(
            fibonacci_recursive(100),
            Err(FibonacciError::Overflow { index: 100 })
        );
        assert!(FibonacciCache::new().get(94).is_err());
    }

    #[test]
    fn test_cache_is_owned_and_reusable() {
        let mut cache = FibonacciCache::new();
        assert!(cache.is_empty());

        assert_eq!(cache.get(50), Ok(12_586_269_025));
        let cached = cache.len();
        assert_eq!(cached, 49); // 2..=50

        // 既にキャッシュ済みの範囲はエントリを増やさない
        assert_eq!(cache.get(30), Ok(832_040));
        assert_eq!(cache.len(), cached);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fibonacci_task_serialization() {
        let task = FibonacciTask::new(FibAlgorithm::Memoized);
        let encoded = serde_json::to_string(&task).unwrap();
        assert_eq!(encoded, r#"{"algorithm":"memoized"}"#);

        let decoded: FibonacciTask = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, task);
        assert_eq!(decoded.compute_index(10).unwrap(), 55);
    }

    #[test]
    fn test_memoized_task_reuses_worker_cache() {
        let task = FibonacciTask::new(FibAlgorithm::Memoized);
        let mut cache = FibonacciCache::new();

        assert_eq!(task.compute(&mut cache, 40).unwrap(), 102_334_155);
        assert_eq!(cache.len(), 39);

        // 後続のインデックスは同じキャッシュから引く
        assert_eq!(task.compute(&mut cache, 25).unwrap(), 75_025);
        assert_eq!(task.compute(&mut cache, 41).unwrap(), 165_580_141);
        assert_eq!(cache.len(), 40);
    }

    #[test]
    fn test_non_memoized_tasks_leave_cache_untouched() {
        let mut cache = FibonacciCache::new();
        for algorithm in [FibAlgorithm::Recursive, FibAlgorithm::Iterative] {
            let task = FibonacciTask::new(algorithm);
            assert_eq!(task.compute(&mut cache, 20).unwrap(), 6_765);
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fibonacci_task_failure_message() {
        let task = FibonacciTask::new(FibAlgorithm::Iterative);
        let error = task.compute_index(120).unwrap_err();
        assert!(error.to_string().contains("F(120)"));
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(FibAlgorithm::Recursive.name(), "recursive");
        assert_eq!(FibAlgorithm::Iterative.name(), "iterative");
        assert_eq!(FibAlgorithm::Memoized.name(), "memoized");
    }
}
