// 有界パイプライン
//
// source → 変換ステージ → … → sink を有界FIFOキューで連結し、全ステージを
// 同時に実行する。各キューは生産者1・消費者1で、EndOfStreamが終了を伝える。

pub mod engine;
pub mod queue;
pub mod sequential;
pub mod sink;
pub mod source;
pub mod stage;
pub mod transforms;

// 公開API
pub use engine::{process_text_file, text_pipeline, Pipeline, PipelineSummary, QueuePeak};
pub use queue::{bounded_queue, Message, QueueClosed, QueueGauge, QueueReceiver, QueueSender};
pub use sequential::process_text_sequential;
pub use sink::{LineFileSink, MemorySink, RecordSink};
pub use source::{LineFileSource, MemorySource, RecordSource};
pub use stage::{transform_fn, FailurePolicy, FnTransform, StageReport, StageState, Transform};
pub use transforms::{StripWhitespace, Uppercase};
