//! 带确认的步骤执行器
//!
//! 执行动作后调用 ConfirmationWatcher 等待成功标记；负责单次调用内的微重试（例如动画
//! 延迟了文字出现，需要重新点击）。每次观察结果在返回前写入审计日志。

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::core::AutomationError;
use crate::input::Action;
use crate::journal::{AttemptRecord, AuditJournal};
use crate::validation::{ConfirmationWatcher, StepDescriptor};
use crate::vision::ScreenRegion;

/// 一次带确认执行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub confirmed: bool,
    pub last_text: String,
    /// 实际执行动作的次数
    pub passes: u32,
}

/// 单次执行的参数
#[derive(Debug, Clone, Copy)]
pub struct ValidationRequest<'a> {
    pub label: &'a str,
    pub markers: &'a [String],
    pub max_attempts: u32,
    pub attempt: u32,
    pub run_id: Option<Uuid>,
    pub region: Option<&'a ScreenRegion>,
    pub timeout: Option<Duration>,
}

impl<'a> ValidationRequest<'a> {
    pub fn new(label: &'a str, markers: &'a [String], max_attempts: u32) -> Self {
        Self {
            label,
            markers,
            max_attempts,
            attempt: 1,
            run_id: None,
            region: None,
            timeout: None,
        }
    }

    /// 由编排器发起的第 attempt 次尝试
    pub fn for_step(step: &'a StepDescriptor, attempt: u32, run_id: Uuid) -> Self {
        Self {
            label: &step.step_id,
            markers: step.markers(),
            max_attempts: step.max_attempts_within_call,
            attempt,
            run_id: Some(run_id),
            region: step.region.as_ref(),
            timeout: step.timeout,
        }
    }
}

/// 带确认的步骤执行器
#[derive(Clone)]
pub struct ValidatedStepExecutor {
    watcher: ConfirmationWatcher,
    journal: Arc<AuditJournal>,
    timeout: Duration,
    poll_interval: Duration,
}

impl ValidatedStepExecutor {
    pub fn new(
        watcher: ConfirmationWatcher,
        journal: Arc<AuditJournal>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            watcher,
            journal,
            timeout,
            poll_interval,
        }
    }

    /// 执行动作并等待成功标记；max_attempts 为 0 时按 1 处理
    pub async fn run_validated(
        &self,
        label: &str,
        action: &dyn Action,
        markers: &[String],
        max_attempts: u32,
    ) -> Result<ValidationOutcome, AutomationError> {
        self.execute(action, ValidationRequest::new(label, markers, max_attempts))
            .await
    }

    /// 动作抛错时记录 FailureError 并返回 ActionFailed（不做微重试，交给编排器计数）
    ///
    /// 每次派发动作前检查停止信号；已停止则不再向游戏发送任何输入。
    pub async fn execute(
        &self,
        action: &dyn Action,
        req: ValidationRequest<'_>,
    ) -> Result<ValidationOutcome, AutomationError> {
        let max_attempts = req.max_attempts.max(1);
        let timeout = req.timeout.unwrap_or(self.timeout);
        let mut last_text = String::new();

        for pass in 1..=max_attempts {
            if self.watcher.is_cancelled() {
                tracing::info!(step = %req.label, attempt = req.attempt, pass, "stopped before dispatch");
                return Err(AutomationError::Cancelled);
            }
            if let Err(e) = action.perform().await {
                self.journal.log_attempt(
                    &AttemptRecord::errored(req.label, req.attempt, e.as_str())
                        .with_pass(pass)
                        .with_run_id(req.run_id),
                );
                tracing::warn!(step = %req.label, attempt = req.attempt, pass, error = %e, "action failed");
                return Err(AutomationError::ActionFailed(e));
            }

            let outcome = self
                .watcher
                .watch(req.markers, timeout, self.poll_interval, req.region)
                .await;
            if outcome.cancelled {
                self.journal.log_attempt(
                    &AttemptRecord::cancelled(req.label, req.attempt)
                        .with_pass(pass)
                        .with_run_id(req.run_id),
                );
                return Err(AutomationError::Cancelled);
            }
            last_text = outcome.last_text;

            self.journal.log_attempt(
                &AttemptRecord::observed(req.label, req.attempt, outcome.success, last_text.as_str())
                    .with_pass(pass)
                    .with_run_id(req.run_id),
            );
            if outcome.success {
                tracing::info!(step = %req.label, attempt = req.attempt, pass, "step confirmed");
                return Ok(ValidationOutcome {
                    confirmed: true,
                    last_text,
                    passes: pass,
                });
            }
            tracing::info!(step = %req.label, attempt = req.attempt, pass, observed = %last_text, "confirmation not observed");
        }

        Ok(ValidationOutcome {
            confirmed: false,
            last_text,
            passes: max_attempts,
        })
    }
}
