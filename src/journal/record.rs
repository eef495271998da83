//! 审计记录：每次尝试一条 AttemptRecord，每次失败重试一行 RetryLine

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 单次尝试的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// 确认文字未出现（超时）
    FailureObserved,
    /// 动作或回退抛错
    FailureError,
    /// 停止信号中断了等待
    Cancelled,
}

impl AttemptOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, AttemptOutcome::Success)
    }
}

/// 审计日志中的一条尝试记录（JSON Lines，只追加）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub step_id: String,
    pub attempt: u32,
    /// 同一次尝试内的第几次微重试（重新点击）
    #[serde(default = "first_pass")]
    pub pass: u32,
    pub outcome: AttemptOutcome,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn first_pass() -> u32 {
    1
}

impl AttemptRecord {
    pub fn new(step_id: &str, attempt: u32, outcome: AttemptOutcome) -> Self {
        Self {
            timestamp: Local::now(),
            run_id: None,
            step_id: step_id.to_string(),
            attempt,
            pass: first_pass(),
            outcome,
            success: outcome.is_success(),
            observed_text: None,
            error: None,
        }
    }

    /// 观察到的文字：确认成功或超时
    pub fn observed(step_id: &str, attempt: u32, success: bool, text: impl Into<String>) -> Self {
        let outcome = if success {
            AttemptOutcome::Success
        } else {
            AttemptOutcome::FailureObserved
        };
        Self {
            observed_text: Some(text.into()),
            ..Self::new(step_id, attempt, outcome)
        }
    }

    /// 等待确认时收到停止信号；不记录观察文字
    pub fn cancelled(step_id: &str, attempt: u32) -> Self {
        Self::new(step_id, attempt, AttemptOutcome::Cancelled)
    }

    pub fn errored(step_id: &str, attempt: u32, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(step_id, attempt, AttemptOutcome::FailureError)
        }
    }

    pub fn with_run_id(mut self, run_id: Option<Uuid>) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_pass(mut self, pass: u32) -> Self {
        self.pass = pass;
        self
    }
}

/// 重试日志的一行：`timestamp,step_label,attempt,reason`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryLine {
    pub timestamp: String,
    pub step_label: String,
    pub attempt: u32,
    pub reason: String,
}

impl RetryLine {
    pub fn new(step_label: &str, attempt: u32, reason: &str) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            step_label: one_line(step_label).replace(',', ";"),
            attempt,
            reason: one_line(reason),
        }
    }

    /// reason 是最后一个字段，可以包含逗号
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.timestamp, self.step_label, self.attempt, self.reason
        )
    }

    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.splitn(4, ',');
        let timestamp = parts.next()?.to_string();
        let step_label = parts.next()?.to_string();
        let attempt = parts.next()?.trim().parse().ok()?;
        let reason = parts.next().unwrap_or("").to_string();
        Some(Self {
            timestamp,
            step_label,
            attempt,
            reason,
        })
    }
}

fn one_line(s: &str) -> String {
    s.trim().replace(['\r', '\n'], " ")
}
