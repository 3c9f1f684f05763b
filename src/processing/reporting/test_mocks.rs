// テスト用の進捗報告モック実装

use super::traits::ProgressReporter;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockProgressReporter {
    pub started_calls: Arc<Mutex<Vec<usize>>>,
    pub progress_calls: Arc<Mutex<Vec<(usize, usize)>>>,
    pub error_calls: Arc<Mutex<Vec<(String, String)>>>,
    pub completed_called: Arc<Mutex<Option<(usize, usize)>>>,
}

impl MockProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.error_calls.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.progress_calls.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Option<(usize, usize)> {
        *self.completed_called.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl ProgressReporter for MockProgressReporter {
    async fn report_started(&self, total_items: usize) {
        self.started_calls.lock().unwrap().push(total_items);
    }

    async fn report_progress(&self, completed: usize, total: usize) {
        self.progress_calls.lock().unwrap().push((completed, total));
    }

    async fn report_error(&self, item: &str, error: &str) {
        self.error_calls
            .lock()
            .unwrap()
            .push((item.to_string(), error.to_string()));
    }

    async fn report_completed(&self, succeeded: usize, failed: usize) {
        *self.completed_called.lock().unwrap() = Some((succeeded, failed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_reporter_trait() {
        let reporter = MockProgressReporter::new();

        reporter.report_started(100).await;
        assert_eq!(*reporter.started_calls.lock().unwrap(), vec![100]);

        reporter.report_progress(50, 100).await;
        reporter.report_progress(100, 100).await;
        assert_eq!(reporter.progress(), vec![(50, 100), (100, 100)]);

        reporter.report_error("task 3", "overflow").await;
        assert_eq!(
            reporter.errors(),
            vec![("task 3".to_string(), "overflow".to_string())]
        );

        reporter.report_completed(99, 1).await;
        assert_eq!(reporter.completed(), Some((99, 1)));
    }

    #[tokio::test]
    async fn test_clones_share_recorded_calls() {
        let reporter = MockProgressReporter::new();
        let handle = reporter.clone();
        let reporter_ref: &dyn ProgressReporter = &reporter;

        reporter_ref.report_error("line 1", "bad").await;
        reporter_ref.report_completed(0, 1).await;

        assert_eq!(handle.errors().len(), 1);
        assert_eq!(handle.completed(), Some((0, 1)));
    }
}
