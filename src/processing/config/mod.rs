// 実行設定の管理
//
// 具象実装（DefaultExecutionConfig, ConfigPreset）は processing::implementations にある。

pub mod traits;

// 公開API
pub use traits::*;
