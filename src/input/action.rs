//! 动作：移动、对话选项、任务指令、单键
//!
//! 核心不关心动作内部做了什么，只关心它是否抛错；成功与否由屏幕文字确认。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::input::InputDriver;

/// 可序列化的动作类型（步骤计划中的 `action` 字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// 按方向移动一段时间
    Move { direction: String, duration_ms: u64 },
    /// 选择对话选项（按下对应按键）
    DialogueChoice { key: String },
    /// 在聊天/指令框输入任务指令
    QuestCommand { command: String },
    KeyPress { key: String },
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Move {
                direction,
                duration_ms,
            } => write!(f, "move {direction} for {duration_ms}ms"),
            ActionKind::DialogueChoice { key } => write!(f, "dialogue choice '{key}'"),
            ActionKind::QuestCommand { command } => write!(f, "quest command '{command}'"),
            ActionKind::KeyPress { key } => write!(f, "key '{key}'"),
        }
    }
}

/// 动作 trait：执行一次副作用；Err 表示硬失败（计入重试）
#[async_trait]
pub trait Action: Send + Sync {
    async fn perform(&self) -> Result<(), String>;
}

#[async_trait]
impl<F> Action for F
where
    F: Fn() -> Result<(), String> + Send + Sync,
{
    async fn perform(&self) -> Result<(), String> {
        self()
    }
}

/// 通过 InputDriver 派发的类型化动作
pub struct DispatchAction {
    kind: ActionKind,
    driver: Arc<dyn InputDriver>,
}

impl DispatchAction {
    pub fn new(kind: ActionKind, driver: Arc<dyn InputDriver>) -> Self {
        Self { kind, driver }
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }
}

#[async_trait]
impl Action for DispatchAction {
    async fn perform(&self) -> Result<(), String> {
        self.driver.dispatch(&self.kind).await
    }
}
