//! 自动化错误类型
//!
//! 与 RetryOrchestrator 配合：动作/回退失败在编排层被捕获并计入重试，
//! 只有日志目录不可用、模式非法等真正异常的情况才会向调用方传播。

use thiserror::Error;

/// 自动化执行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AutomationError {
    /// 动作（移动、点击对话选项、任务指令）执行时抛错
    #[error("Action failed: {0}")]
    ActionFailed(String),

    /// 所有重试耗尽后调用的回退动作抛错
    #[error("Fallback failed: {0}")]
    FallbackFailed(String),

    /// 注册时编译失败的匹配表达式
    #[error("Invalid pattern '{id}': {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    /// 无法创建或打开审计日志目录
    #[error("Journal unavailable: {0}")]
    JournalUnavailable(#[from] std::io::Error),

    #[error("Text source error: {0}")]
    TextSource(String),

    #[error("Input dispatch failed: {0}")]
    Input(String),

    #[error("Invalid step plan: {0}")]
    Plan(String),

    /// 外部停止信号中断了等待
    #[error("Cancelled")]
    Cancelled,
}

impl AutomationError {
    /// 写入重试日志 / 审计日志时使用的原因文本
    pub fn reason(&self) -> String {
        match self {
            AutomationError::ActionFailed(msg) | AutomationError::FallbackFailed(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        }
    }
}
