// 実行設定と進捗報告
// ファンアウト処理・パイプライン・画像バッチが共通で使う周辺機能

pub mod config;       // 実行設定
pub mod reporting;    // 進捗報告
pub mod implementations;

// 公開API - 各機能から再エクスポート
pub use config::ExecutionConfig;
pub use reporting::ProgressReporter;
pub use implementations::{
    ConfigPreset,
    ConsoleProgressReporter,
    DefaultExecutionConfig,
    NoOpProgressReporter,
    DEFAULT_QUEUE_CAPACITY,
};
