// ステージ定義 - 状態機械・変換トレイト・失敗ポリシー

use crate::core::LabError;
use serde::{Deserialize, Serialize};

/// ステージの状態: Idle → Running → Draining → Terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    #[default]
    Idle,
    Running,
    Draining,
    Terminated,
}

impl StageState {
    /// 許可された遷移かどうか
    ///
    /// 下流が閉じた場合などはRunningから直接Terminatedへ進める。
    pub fn can_advance_to(self, next: StageState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Terminated)
                | (Self::Draining, Self::Terminated)
        )
    }
}

/// 変換ステージ失敗時のポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 直ちにEndOfStreamを流して終了し、エラーを返す
    #[default]
    FailFast,
    /// そのレコードを報告して読み飛ばす
    SkipRecord,
}

/// 1レコードに適用する変換
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, record: String) -> anyhow::Result<String>;
}

/// クロージャによる変換
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(String) -> anyhow::Result<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, record: String) -> anyhow::Result<String> {
        (self.f)(record)
    }
}

pub fn transform_fn<F>(name: impl Into<String>, f: F) -> FnTransform<F>
where
    F: Fn(String) -> anyhow::Result<String> + Send + Sync,
{
    FnTransform {
        name: name.into(),
        f,
    }
}

/// 1ステージの実行結果
#[derive(Debug)]
pub struct StageReport {
    pub name: String,
    pub state: StageState,
    pub records_in: usize,
    pub records_out: usize,
    pub skipped: usize,
    pub error: Option<LabError>,
}

impl StageReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: StageState::Idle,
            records_in: 0,
            records_out: 0,
            skipped: 0,
            error: None,
        }
    }

    /// 状態を進める（不正な遷移は無視して現在の状態を保つ）
    pub(crate) fn advance(&mut self, next: StageState) {
        if self.state.can_advance_to(next) {
            self.state = next;
        }
    }

    /// 最初のエラーだけを保持する
    pub(crate) fn fail(&mut self, error: LabError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
