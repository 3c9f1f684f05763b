// 出力先 - 受け取った順にレコードを書き出す

use crate::core::{LabError, LabResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// 逐次的なレコード消費先
#[async_trait]
pub trait RecordSink: Send {
    fn describe(&self) -> String;

    async fn open(&mut self) -> LabResult<()>;

    async fn write_record(&mut self, record: &str) -> LabResult<()>;

    /// EndOfStreamを受け取った後に1回だけ呼ばれる
    async fn close(&mut self) -> LabResult<()>;
}

/// テキストファイルへ1レコード1行で書く
pub struct LineFileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl LineFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> LabResult<&mut BufWriter<File>> {
        let path = &self.path;
        self.writer.as_mut().ok_or_else(|| {
            LabError::sink_write(
                path,
                std::io::Error::new(std::io::ErrorKind::NotConnected, "出力先が開かれていません"),
            )
        })
    }
}

#[async_trait]
impl RecordSink for LineFileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn open(&mut self) -> LabResult<()> {
        let file = File::create(&self.path)
            .await
            .map_err(|e| LabError::sink_write(&self.path, e))?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    async fn write_record(&mut self, record: &str) -> LabResult<()> {
        let path = self.path.clone();
        let writer = self.writer()?;
        writer
            .write_all(record.as_bytes())
            .await
            .map_err(|e| LabError::sink_write(&path, e))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| LabError::sink_write(&path, e))
    }

    async fn close(&mut self) -> LabResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .await
                .map_err(|e| LabError::sink_write(&self.path, e))?;
        }
        Ok(())
    }
}

/// メモリへ書き込む出力先（クローンは同じバッファを共有する）
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 書き込まれたレコードのコピー
    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|closed| *closed).unwrap_or(false)
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn open(&mut self) -> LabResult<()> {
        Ok(())
    }

    async fn write_record(&mut self, record: &str) -> LabResult<()> {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.to_string());
        }
        Ok(())
    }

    async fn close(&mut self) -> LabResult<()> {
        if let Ok(mut closed) = self.closed.lock() {
            *closed = true;
        }
        Ok(())
    }
}
