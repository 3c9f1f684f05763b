// 進捗報告
//
// ConsoleProgressReporter / NoOpProgressReporter は processing::implementations にある。

pub mod traits;

#[cfg(test)]
pub mod test_mocks;

// 公開API
pub use traits::*;

// テストモック（テスト時のみ）
#[cfg(test)]
pub use test_mocks::*;
