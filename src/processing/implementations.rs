// 設定と進捗報告の基本実装

use super::{ExecutionConfig, ProgressReporter};
use crate::core::{LabError, LabResult};
use crate::pipeline::FailurePolicy;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// 元のスクリプトが使っていたキュー容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// デフォルト設定実装
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefaultExecutionConfig {
    workers: usize,
    queue_capacity: usize,
    failure_policy: FailurePolicy,
    #[serde(rename = "gather_deadline_ms", deserialize_with = "deserialize_millis")]
    gather_deadline: Option<Duration>,
    enable_progress: bool,
}

/// 設定ファイルの期限はミリ秒で書く
fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

impl DefaultExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_gather_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.gather_deadline = deadline;
        self
    }

    pub fn with_progress_reporting(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }

    /// JSON設定ファイルから読み込む（省略したキーはデフォルト値）
    pub fn from_json_file(path: &Path) -> LabResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LabError::io(format!("設定ファイル {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            LabError::configuration(format!("{} の解析に失敗: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DefaultExecutionConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            failure_policy: FailurePolicy::FailFast,
            gather_deadline: None,
            enable_progress: true,
        }
    }
}

impl ExecutionConfig for DefaultExecutionConfig {
    fn worker_count(&self) -> usize {
        self.workers
    }

    fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    fn gather_deadline(&self) -> Option<Duration> {
        self.gather_deadline
    }

    fn enable_progress_reporting(&self) -> bool {
        self.enable_progress
    }
}

/// 設定プリセット
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigPreset {
    /// CPU数のワーカー、容量100
    #[default]
    Default,
    /// CPU数x2のワーカー、容量1000
    HighThroughput,
    /// ワーカー2、容量1、期限30秒（テスト向け）
    Testing,
}

impl ConfigPreset {
    pub fn config(self) -> DefaultExecutionConfig {
        match self {
            Self::Default => DefaultExecutionConfig::default(),
            Self::HighThroughput => DefaultExecutionConfig::default()
                .with_workers(num_cpus::get().max(1) * 2)
                .with_queue_capacity(1000),
            Self::Testing => DefaultExecutionConfig::default()
                .with_workers(2)
                .with_queue_capacity(1)
                .with_gather_deadline(Some(Duration::from_secs(30)))
                .with_progress_reporting(false),
        }
    }
}

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    /// 設定の進捗報告フラグに従って作成
    pub fn from_config<C: ExecutionConfig>(config: &C) -> Self {
        Self {
            quiet: !config.enable_progress_reporting(),
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, total_items: usize) {
        if !self.quiet {
            println!("🚀 Starting {total_items} items...");
        }
    }

    async fn report_progress(&self, completed: usize, total: usize) {
        if !self.quiet && total > 0 && (completed % 100 == 0 || completed == total) {
            let percentage = (completed as f64 / total as f64) * 100.0;
            println!("📊 Progress: {completed}/{total} ({percentage:.1}%)");
        }
    }

    async fn report_error(&self, item: &str, error: &str) {
        // エラーはquietでも標準エラーに出す
        eprintln!("❌ Error in {item}: {error}");
    }

    async fn report_completed(&self, succeeded: usize, failed: usize) {
        if !self.quiet {
            println!("✅ Completed! Succeeded: {succeeded}, Failed: {failed}");
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _total_items: usize) {}

    async fn report_progress(&self, _completed: usize, _total: usize) {}

    async fn report_error(&self, _item: &str, _error: &str) {}

    async fn report_completed(&self, _succeeded: usize, _failed: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_execution_config() {
        let config = DefaultExecutionConfig::default();

        assert_eq!(config.worker_count(), num_cpus::get().max(1));
        assert_eq!(config.queue_capacity(), 100);
        assert_eq!(config.failure_policy(), FailurePolicy::FailFast);
        assert!(config.gather_deadline().is_none());
        assert!(config.enable_progress_reporting());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_execution_config_builder() {
        let config = DefaultExecutionConfig::new()
            .with_workers(8)
            .with_queue_capacity(1)
            .with_failure_policy(FailurePolicy::SkipRecord)
            .with_gather_deadline(Some(Duration::from_secs(2)))
            .with_progress_reporting(false);

        assert_eq!(config.worker_count(), 8);
        assert_eq!(config.queue_capacity(), 1);
        assert_eq!(config.failure_policy(), FailurePolicy::SkipRecord);
        assert_eq!(config.gather_deadline(), Some(Duration::from_secs(2)));
        assert!(!config.enable_progress_reporting());
    }

    #[test]
    fn test_sub_millisecond_deadline_is_kept() {
        let config = DefaultExecutionConfig::new()
            .with_gather_deadline(Some(Duration::from_micros(500)));

        assert_eq!(config.gather_deadline(), Some(Duration::from_micros(500)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let testing = ConfigPreset::Testing.config();
        assert_eq!(testing.worker_count(), 2);
        assert_eq!(testing.queue_capacity(), 1);
        assert!(testing.gather_deadline().is_some());

        let high = ConfigPreset::HighThroughput.config();
        assert_eq!(high.worker_count(), num_cpus::get().max(1) * 2);
        assert_eq!(high.queue_capacity(), 1000);

        assert_eq!(ConfigPreset::default().config(), DefaultExecutionConfig::default());
    }

    #[test]
    fn test_from_json_file_partial() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lab.json");
        fs::write(
            &path,
            r#"{ "workers": 3, "failure_policy": "skip_record", "gather_deadline_ms": 1500 }"#,
        )
        .unwrap();

        let config = DefaultExecutionConfig::from_json_file(&path).unwrap();

        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.failure_policy(), FailurePolicy::SkipRecord);
        assert_eq!(config.gather_deadline(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_from_json_file_invalid() {
        let temp_dir = TempDir::new().unwrap();

        let zero_workers = temp_dir.path().join("zero.json");
        fs::write(&zero_workers, r#"{ "workers": 0 }"#).unwrap();
        let result = DefaultExecutionConfig::from_json_file(&zero_workers);
        assert!(matches!(result, Err(LabError::ConfigurationError { .. })));

        let broken = temp_dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let result = DefaultExecutionConfig::from_json_file(&broken);
        assert!(matches!(result, Err(LabError::ConfigurationError { .. })));

        let missing = temp_dir.path().join("missing.json");
        let result = DefaultExecutionConfig::from_json_file(&missing);
        assert!(matches!(result, Err(LabError::Io { .. })));
    }

    #[tokio::test]
    async fn test_console_progress_reporter() {
        let reporter = ConsoleProgressReporter::quiet();

        reporter.report_started(100).await;
        reporter.report_progress(50, 100).await;
        reporter.report_progress(0, 0).await;
        reporter.report_error("task 3", "test error").await;
        reporter.report_completed(99, 1).await;
    }

    #[test]
    fn test_console_progress_reporter_creation() {
        assert!(!ConsoleProgressReporter::new().is_quiet());
        assert!(ConsoleProgressReporter::quiet().is_quiet());

        let config = DefaultExecutionConfig::default().with_progress_reporting(false);
        assert!(ConsoleProgressReporter::from_config(&config).is_quiet());
    }

    #[tokio::test]
    async fn test_noop_progress_reporter() {
        let reporter = NoOpProgressReporter::new();

        reporter.report_started(100).await;
        reporter.report_progress(50, 100).await;
        reporter.report_error("task 3", "test error").await;
        reporter.report_completed(99, 1).await;
    }
}
