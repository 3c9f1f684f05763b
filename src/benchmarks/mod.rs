//! 逐次実行と並列実行の性能比較
//!
//! フィボナッチ（逐次・スレッド・プロセス）とテキスト処理（逐次・パイプライン）

pub mod comparison;

pub use comparison::{
    compare_fibonacci, compare_text_processing, format_thousands, render_fibonacci_table,
    BackendTiming, FibonacciComparison, TextComparison,
};
