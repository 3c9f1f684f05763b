// 統合テスト用のヘルパー
// 各テストファイルから `mod fixtures;` で取り込む
#![allow(dead_code)]

use async_trait::async_trait;
use parallel_lab::core::LabResult;
use parallel_lab::pipeline::{MemorySource, RecordSink, RecordSource};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// `cargo test` がビルドしたバイナリ（プロセスワーカーとして使う）
pub fn worker_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_parallel_lab"))
}

/// 1行1レコードのテキストファイルを作る
pub fn write_lines(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut content = lines.join("\n");
    if !lines.is_empty() {
        content.push('\n');
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// 単色のRGB画像を保存する
pub fn write_rgb_image(dir: &Path, name: &str, color: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    let image = image::RgbImage::from_pixel(4, 4, image::Rgb(color));
    image.save(&path).unwrap();
    path
}

/// 供給したレコード数を数える入力元
pub struct CountingSource {
    inner: MemorySource,
    emitted: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(records: Vec<String>, emitted: Arc<AtomicUsize>) -> Self {
        Self {
            inner: MemorySource::new(records),
            emitted,
        }
    }
}

#[async_trait]
impl RecordSource for CountingSource {
    fn describe(&self) -> String {
        format!("counting {}", self.inner.describe())
    }

    async fn open(&mut self) -> LabResult<()> {
        self.inner.open().await
    }

    async fn next_record(&mut self) -> LabResult<Option<String>> {
        let record = self.inner.next_record().await?;
        if record.is_some() {
            self.emitted.fetch_add(1, Ordering::SeqCst);
        }
        Ok(record)
    }
}

/// 1件ごとに待つ出力先（背圧の確認用）
///
/// `emitted` を渡すと、書き込みの度に「供給済み - 書き込み済み」の最大値を記録する。
#[derive(Clone, Default)]
pub struct SlowSink {
    delay: Duration,
    records: Arc<Mutex<Vec<String>>>,
    emitted: Option<Arc<AtomicUsize>>,
    max_in_flight: Arc<AtomicUsize>,
}

impl SlowSink {
    pub fn counting(delay: Duration, emitted: Arc<AtomicUsize>) -> Self {
        Self {
            delay,
            emitted: Some(emitted),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<String> {
        self.records.lock().unwrap().clone()
    }

    /// 供給されたがまだ書き込まれていないレコード数の最大値
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSink for SlowSink {
    fn describe(&self) -> String {
        "slow sink".to_string()
    }

    async fn open(&mut self) -> LabResult<()> {
        Ok(())
    }

    async fn write_record(&mut self, record: &str) -> LabResult<()> {
        tokio::time::sleep(self.delay).await;
        let mut records = self.records.lock().unwrap();
        if let Some(emitted) = &self.emitted {
            let in_flight = emitted.load(Ordering::SeqCst) - records.len();
            self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        }
        records.push(record.to_string());
        Ok(())
    }

    async fn close(&mut self) -> LabResult<()> {
        Ok(())
    }
}
