// 有界FIFOキュー - ペイロードかEndOfStreamを運ぶ

use crate::core::{LabError, LabResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// キューを流れるメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    Payload(T),
    EndOfStream,
}

/// 消費側がいなくなったキューへのpush
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("キュー {queue} の消費側は終了しています")]
pub struct QueueClosed {
    pub queue: String,
}

/// キューの滞留数の計測
#[derive(Debug)]
pub struct QueueGauge {
    name: String,
    capacity: usize,
    peak: AtomicUsize,
}

impl QueueGauge {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 観測された最大滞留数
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    fn observe(&self, buffered: usize) {
        self.peak.fetch_max(buffered, Ordering::Relaxed);
    }
}

/// 生産側（1ステージだけが所有する）
pub struct QueueSender<T> {
    inner: mpsc::Sender<Message<T>>,
    gauge: Arc<QueueGauge>,
}

impl<T> QueueSender<T> {
    /// 満杯なら空きが出るまで待つ
    pub async fn push(&self, message: Message<T>) -> Result<(), QueueClosed> {
        self.inner.send(message).await.map_err(|_| QueueClosed {
            queue: self.gauge.name.clone(),
        })?;
        self.gauge
            .observe(self.inner.max_capacity() - self.inner.capacity());
        Ok(())
    }
}

/// 消費側（1ステージだけが所有する）
pub struct QueueReceiver<T> {
    inner: mpsc::Receiver<Message<T>>,
}

impl<T> QueueReceiver<T> {
    /// 空なら届くまで待つ。生産側がEndOfStreamを送らずに消えた場合はNone
    pub async fn pop(&mut self) -> Option<Message<T>> {
        self.inner.recv().await
    }

    /// これ以上受け取らない。生産側は次のpushでQueueClosedを受け取る
    pub fn close(&mut self) {
        self.inner.close();
    }
}

/// 容量capacityのキューを作成する
pub fn bounded_queue<T>(
    name: impl Into<String>,
    capacity: usize,
) -> LabResult<(QueueSender<T>, QueueReceiver<T>, Arc<QueueGauge>)> {
    if capacity == 0 {
        return Err(LabError::configuration(
            "キュー容量は1以上である必要があります",
        ));
    }

    let (tx, rx) = mpsc::channel(capacity);
    let gauge = Arc::new(QueueGauge {
        name: name.into(),
        capacity,
        peak: AtomicUsize::new(0),
    });

    Ok((
        QueueSender {
            inner: tx,
            gauge: Arc::clone(&gauge),
        },
        QueueReceiver { inner: rx },
        gauge,
    ))
}
