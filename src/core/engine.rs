//! 自动化引擎：持有模式注册表、审计日志、文字来源、输入驱动与时钟的上下文对象
//!
//! 每个实例互相独立（测试可各建一个）；Clone 后共享同一注册表与日志，可在多个任务中并发执行步骤。

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::core::AutomationError;
use crate::input::{Action, ActionKind, DispatchAction, InputDriver};
use crate::journal::AuditJournal;
use crate::patterns::{DefaultResponse, DetectionResult, PatternClassifier};
use crate::validation::{
    Clock, ConfirmationWatcher, Fallback, RetryOrchestrator, RunReport, StepDescriptor,
    ValidatedStepExecutor, ValidationOutcome,
};
use crate::vision::{ScreenRegion, TextSource};

/// 自动化引擎（由 EngineBuilder 构建）
#[derive(Clone)]
pub struct AutomationEngine {
    pub(crate) classifier: Arc<PatternClassifier>,
    pub(crate) journal: Arc<AuditJournal>,
    pub(crate) source: Arc<dyn TextSource>,
    pub(crate) driver: Arc<dyn InputDriver>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) cancel: CancellationToken,
    pub(crate) timeout: Duration,
    pub(crate) poll_interval: Duration,
}

impl AutomationEngine {
    pub fn classifier(&self) -> &PatternClassifier {
        &self.classifier
    }

    pub fn journal(&self) -> &AuditJournal {
        &self.journal
    }

    pub fn driver(&self) -> Arc<dyn InputDriver> {
        Arc::clone(&self.driver)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行时注册新的对话模式（可与进行中的分类并发）
    pub fn register_pattern<S: AsRef<str>>(
        &self,
        id: &str,
        expressions: &[S],
        response: DefaultResponse,
    ) -> Result<bool, AutomationError> {
        self.classifier.register_pattern(id, expressions, response)
    }

    pub fn classify(&self, text: &str) -> Option<DetectionResult> {
        self.classifier.classify(text)
    }

    pub fn watcher(&self) -> ConfirmationWatcher {
        ConfirmationWatcher::new(Arc::clone(&self.source), Arc::clone(&self.clock))
            .with_cancellation(self.cancel.clone())
    }

    pub fn executor(&self) -> ValidatedStepExecutor {
        ValidatedStepExecutor::new(
            self.watcher(),
            Arc::clone(&self.journal),
            self.timeout,
            self.poll_interval,
        )
    }

    pub fn orchestrator(&self) -> RetryOrchestrator {
        RetryOrchestrator::new(
            self.executor(),
            Arc::clone(&self.journal),
            Arc::clone(&self.clock),
        )
        .with_cancellation(self.cancel.clone())
    }

    /// 执行动作并等待成功标记（单次调用内的微重试）
    pub async fn run_validated(
        &self,
        label: &str,
        action: &dyn Action,
        markers: &[String],
        max_attempts: u32,
    ) -> Result<ValidationOutcome, AutomationError> {
        self.executor()
            .run_validated(label, action, markers, max_attempts)
            .await
    }

    /// 以任意动作 / 回退执行步骤的重试状态机
    pub async fn execute_with_retry(
        &self,
        step: &StepDescriptor,
        action: &dyn Action,
        fallback: Option<&dyn Fallback>,
    ) -> RunReport {
        self.orchestrator()
            .execute_with_retry(step, action, fallback)
            .await
    }

    /// 通过输入驱动派发步骤声明的动作与回退
    pub async fn run_step(&self, step: &StepDescriptor) -> RunReport {
        let action = DispatchAction::new(step.action.clone(), self.driver());
        let fallback = step
            .fallback
            .clone()
            .map(|kind| DispatchAction::new(kind, self.driver()));
        self.execute_with_retry(
            step,
            &action,
            fallback.as_ref().map(|f| f as &dyn Fallback),
        )
        .await
    }

    /// 并发执行多个互不相关的步骤，每个步骤有自己的重试状态；结果顺序与输入一致
    pub async fn run_all(&self, steps: &[StepDescriptor]) -> Vec<RunReport> {
        join_all(steps.iter().map(|step| self.run_step(step))).await
    }

    /// 读取屏幕、分类，并对命中的对话发送默认响应按键
    ///
    /// 未命中或命中的是纯状态标记（无响应按键）时不派发任何输入。
    pub async fn respond_to_screen(
        &self,
        region: Option<&ScreenRegion>,
    ) -> Result<Option<DetectionResult>, AutomationError> {
        let text = self
            .source
            .read_text(region)
            .await
            .map_err(AutomationError::TextSource)?;
        let Some(detection) = self.classify(&text) else {
            tracing::debug!(text = %text, "no dialogue recognized");
            return Ok(None);
        };

        if detection.is_actionable() {
            if let Some(key) = &detection.chosen_response_key {
                tracing::info!(
                    pattern = %detection.pattern_id,
                    confidence = detection.confidence,
                    key = %key,
                    "responding to dialogue"
                );
                self.driver
                    .dispatch(&ActionKind::KeyPress { key: key.clone() })
                    .await
                    .map_err(AutomationError::Input)?;
            }
        }
        Ok(Some(detection))
    }
}
