//! 逐次実行と並列実行を比べるための実験場
//!
//! - [`fanout`]: N個の独立タスクを配って入力順に集める（スレッド・プロセス・逐次）
//! - [`pipeline`]: 有界キューでつないだ段階処理（背圧・EndOfStream・fail-fast）
//! - [`grayscale`] / [`fibonacci`]: 上記で動かす題材

pub mod benchmarks;
pub mod cli;
pub mod core;
pub mod fanout;
pub mod fibonacci;
pub mod grayscale;
pub mod pipeline;
pub mod processing;
pub mod storage;

pub use crate::core::error::{LabError, LabResult};
pub use crate::core::types::{IndexedFailure, IndexedResult};
