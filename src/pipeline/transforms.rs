// テキスト変換ステージ

use super::stage::Transform;

/// 前後の空白を取り除く
#[derive(Debug, Clone, Copy, Default)]
pub struct StripWhitespace;

impl Transform for StripWhitespace {
    fn name(&self) -> &str {
        "strip"
    }

    fn apply(&self, record: String) -> anyhow::Result<String> {
        Ok(record.trim().to_string())
    }
}

/// 大文字へ変換する
#[derive(Debug, Clone, Copy, Default)]
pub struct Uppercase;

impl Transform for Uppercase {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn apply(&self, record: String) -> anyhow::Result<String> {
        Ok(record.to_uppercase())
    }
}

/// 逐次版でも使う strip → uppercase
pub fn apply_text_chain(record: String) -> anyhow::Result<String> {
    Uppercase.apply(StripWhitespace.apply(record)?)
}
