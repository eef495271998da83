//! 重试编排器
//!
//! 在 ValidatedStepExecutor 之上加有界重试、固定间隔与可选回退。一次调用即状态机的一次完整遍历：
//!
//! ```text
//! Attempting(1) -> ... -> Attempting(max_retries) -> Fallback -> FallbackInvoked | Failed
//!        \________________________________________/
//!                         Succeeded
//! ```
//!
//! max_retries = 0 表示不尝试，直接进入回退阶段。取消信号使编排器直接进入 Failed（不调用回退，
//! 也不再发起新的尝试）。

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::AutomationError;
use crate::input::{Action, DispatchAction};
use crate::journal::{AttemptOutcome, AttemptRecord, AuditJournal};
use crate::validation::{Clock, StepDescriptor, ValidatedStepExecutor, ValidationRequest};

/// 回退：所有重试耗尽后调用一次，参数为步骤本身；返回值作为最终结果
#[async_trait]
pub trait Fallback: Send + Sync {
    async fn invoke(&self, step: &StepDescriptor) -> Result<bool, String>;
}

#[async_trait]
impl<F> Fallback for F
where
    F: Fn(&StepDescriptor) -> Result<bool, String> + Send + Sync,
{
    async fn invoke(&self, step: &StepDescriptor) -> Result<bool, String> {
        self(step)
    }
}

/// 派发成功即视为回退成功
#[async_trait]
impl Fallback for DispatchAction {
    async fn invoke(&self, _step: &StepDescriptor) -> Result<bool, String> {
        self.perform().await.map(|_| true)
    }
}

/// 重试状态机的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    /// 普通尝试耗尽，准备调用回退
    Fallback,
    Succeeded,
    FallbackInvoked { result: bool },
    Failed,
}

impl RetryState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RetryState::Succeeded | RetryState::FallbackInvoked { .. } | RetryState::Failed
        )
    }
}

/// 一次编排调用的报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub step_id: String,
    pub success: bool,
    /// 实际进行的普通尝试次数
    pub attempts: u32,
    pub state: RetryState,
    pub fallback_invoked: bool,
    pub cancelled: bool,
}

/// 重试编排器
#[derive(Clone)]
pub struct RetryOrchestrator {
    executor: ValidatedStepExecutor,
    journal: Arc<AuditJournal>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl RetryOrchestrator {
    pub fn new(
        executor: ValidatedStepExecutor,
        journal: Arc<AuditJournal>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            executor,
            journal,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 按步骤的 max_retries / retry_delay 执行；失败的尝试各写一行重试日志
    pub async fn execute_with_retry(
        &self,
        step: &StepDescriptor,
        action: &dyn Action,
        fallback: Option<&dyn Fallback>,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let mut attempts = 0u32;
        let mut cancelled = false;
        let mut state = if step.max_retries == 0 {
            RetryState::Fallback
        } else {
            RetryState::Attempting(1)
        };

        tracing::info!(step = %step.step_id, run_id = %run_id, max_retries = step.max_retries, "step started");

        while !state.is_terminal() {
            state = match state {
                RetryState::Attempting(n) if self.cancel.is_cancelled() => {
                    tracing::info!(step = %step.step_id, attempt = n, "stopped before attempt");
                    cancelled = true;
                    RetryState::Failed
                }
                RetryState::Attempting(n) => {
                    attempts = n;
                    let result = self
                        .executor
                        .execute(action, ValidationRequest::for_step(step, n, run_id))
                        .await;
                    let reason = match result {
                        Ok(outcome) if outcome.confirmed => {
                            state = RetryState::Succeeded;
                            continue;
                        }
                        Ok(outcome) => format!(
                            "confirmation not observed; last text: '{}'",
                            outcome.last_text.trim()
                        ),
                        Err(AutomationError::Cancelled) => {
                            cancelled = true;
                            state = RetryState::Failed;
                            continue;
                        }
                        Err(e) => e.reason(),
                    };

                    self.journal.log_retry(&step.step_id, n, &reason);
                    tracing::warn!(step = %step.step_id, attempt = n, max_retries = step.max_retries, reason = %reason, "attempt failed");

                    tokio::select! {
                        _ = self.clock.sleep(step.retry_delay) => {}
                        _ = self.cancel.cancelled() => {
                            cancelled = true;
                            state = RetryState::Failed;
                            continue;
                        }
                    }

                    if n < step.max_retries {
                        RetryState::Attempting(n + 1)
                    } else {
                        RetryState::Fallback
                    }
                }
                RetryState::Fallback if self.cancel.is_cancelled() => {
                    cancelled = true;
                    RetryState::Failed
                }
                RetryState::Fallback => match fallback {
                    Some(fallback) => {
                        let result = self.invoke_fallback(step, fallback, run_id).await;
                        RetryState::FallbackInvoked { result }
                    }
                    None => RetryState::Failed,
                },
                terminal => terminal,
            };
        }

        let success = match state {
            RetryState::Succeeded => true,
            RetryState::FallbackInvoked { result } => result,
            _ => false,
        };
        tracing::info!(step = %step.step_id, run_id = %run_id, attempts, success, state = ?state, "step finished");

        RunReport {
            run_id,
            step_id: step.step_id.clone(),
            success,
            attempts,
            state,
            fallback_invoked: matches!(state, RetryState::FallbackInvoked { .. }),
            cancelled,
        }
    }

    /// 回退只调用一次；抛错记录到尝试日志并视为失败
    async fn invoke_fallback(&self, step: &StepDescriptor, fallback: &dyn Fallback, run_id: Uuid) -> bool {
        let attempt = step.max_retries + 1;
        tracing::info!(step = %step.step_id, "invoking fallback");
        let record = match fallback.invoke(step).await {
            Ok(result) => {
                let outcome = if result {
                    AttemptOutcome::Success
                } else {
                    AttemptOutcome::FailureObserved
                };
                AttemptRecord::new(&step.step_id, attempt, outcome)
            }
            Err(e) => {
                let err = AutomationError::FallbackFailed(e);
                tracing::warn!(step = %step.step_id, error = %err, "fallback failed");
                AttemptRecord::errored(&step.step_id, attempt, err.to_string())
            }
        };
        let result = record.success;
        self.journal.log_attempt(&record.with_run_id(Some(run_id)));
        result
    }
}
