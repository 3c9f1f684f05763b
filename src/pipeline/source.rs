// 入力元 - レコードを順に供給する

use crate::core::{LabError, LabResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

/// 逐次的なレコード供給元
#[async_trait]
pub trait RecordSource: Send {
    /// ログ・エラー表示用の名前
    fn describe(&self) -> String;

    /// 読み取りを開始する。開けない場合はSourceUnavailable
    async fn open(&mut self) -> LabResult<()>;

    /// 次のレコード。尽きたらNone
    async fn next_record(&mut self) -> LabResult<Option<String>>;
}

/// テキストファイルを1行1レコードで読む
pub struct LineFileSource {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
}

impl LineFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for LineFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn open(&mut self) -> LabResult<()> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| LabError::source_unavailable(&self.path, e))?;
        self.lines = Some(BufReader::new(file).lines());
        Ok(())
    }

    async fn next_record(&mut self) -> LabResult<Option<String>> {
        match self.lines.as_mut() {
            Some(lines) => lines
                .next_line()
                .await
                .map_err(|e| LabError::source_unavailable(&self.path, e)),
            None => Ok(None),
        }
    }
}

/// メモリ上のレコード列
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: VecDeque<String>,
}

impl MemorySource {
    pub fn new<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: records.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }

    async fn open(&mut self) -> LabResult<()> {
        Ok(())
    }

    async fn next_record(&mut self) -> LabResult<Option<String>> {
        Ok(self.records.pop_front())
    }
}
