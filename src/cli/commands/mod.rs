pub mod fib;
pub mod grayscale;
pub mod text;
pub mod worker;

pub use fib::*;
pub use grayscale::*;
pub use text::*;
pub use worker::*;

use crate::core::LabError;
use crate::processing::{ConfigPreset, DefaultExecutionConfig, ExecutionConfig};
use anyhow::Result;
use std::path::Path;

/// プリセットまたは設定ファイルから実行設定を決める
///
/// 設定ファイルがあればプリセットより優先する。`quiet` は進捗表示だけを止める。
pub fn resolve_config(
    preset: ConfigPreset,
    config_file: Option<&Path>,
    quiet: bool,
) -> Result<DefaultExecutionConfig> {
    let mut config = match config_file {
        Some(path) => DefaultExecutionConfig::from_json_file(path)?,
        None => preset.config(),
    };
    if quiet {
        config = config.with_progress_reporting(false);
    }
    config.validate()?;
    Ok(config)
}

/// 終了コード: 実行全体を止めた失敗は2、作業単位の失敗は1
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<LabError>() {
        Some(error) if error.is_structural() => 2,
        _ => 1,
    }
}
