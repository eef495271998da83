//! 输入驱动：把 ActionKind 转成真实的键盘输入
//!
//! CommandDriver 通过外部命令（如 xdotool）模拟按键；RecordingDriver 只记录，用于演练与测试。

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::InputSection;
use crate::input::ActionKind;
use crate::process::run_command;

/// 输入驱动 trait
#[async_trait]
pub trait InputDriver: Send + Sync {
    async fn dispatch(&self, action: &ActionKind) -> Result<(), String>;
}

/// 移动方向到按键的映射（WASD）
pub fn direction_key(direction: &str) -> Option<&'static str> {
    match direction.to_lowercase().as_str() {
        "forward" | "up" | "north" => Some("w"),
        "back" | "backward" | "down" | "south" => Some("s"),
        "left" | "west" => Some("a"),
        "right" | "east" => Some("d"),
        _ => None,
    }
}

/// 外部命令驱动
///
/// 模板占位符：`{key}` 按键、`{secs}` 按住秒数、`{text}` 输入文本。
pub struct CommandDriver {
    key_command: String,
    hold_command: String,
    type_command: String,
    timeout: Duration,
}

impl CommandDriver {
    pub fn from_config(section: &InputSection) -> Self {
        Self {
            key_command: section.key_command.clone(),
            hold_command: section.hold_command.clone(),
            type_command: section.type_command.clone(),
            timeout: Duration::from_secs(section.timeout_secs),
        }
    }

    /// 将动作展开为待执行的命令序列
    pub fn commands_for(&self, action: &ActionKind) -> Result<Vec<String>, String> {
        match action {
            ActionKind::Move {
                direction,
                duration_ms,
            } => {
                let key = direction_key(direction)
                    .ok_or_else(|| format!("Unknown direction: {direction}"))?;
                let secs = format!("{:.3}", *duration_ms as f64 / 1000.0);
                Ok(vec![self
                    .hold_command
                    .replace("{key}", key)
                    .replace("{secs}", &secs)])
            }
            ActionKind::DialogueChoice { key } | ActionKind::KeyPress { key } => {
                Ok(vec![self.key_command.replace("{key}", key)])
            }
            ActionKind::QuestCommand { command } => {
                let text = command.replace('\'', "");
                Ok(vec![
                    self.type_command.replace("{text}", &text),
                    self.key_command.replace("{key}", "Return"),
                ])
            }
        }
    }
}

#[async_trait]
impl InputDriver for CommandDriver {
    async fn dispatch(&self, action: &ActionKind) -> Result<(), String> {
        tracing::info!(action = %action, "dispatch input");
        for command in self.commands_for(action)? {
            run_command(&command, self.timeout).await?;
        }
        Ok(())
    }
}

/// 只记录不执行的驱动（未配置输入命令时的演练模式）
#[derive(Debug, Default)]
pub struct RecordingDriver {
    dispatched: Mutex<Vec<ActionKind>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<ActionKind> {
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl InputDriver for RecordingDriver {
    async fn dispatch(&self, action: &ActionKind) -> Result<(), String> {
        tracing::info!(action = %action, "dry-run input");
        self.dispatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(action.clone());
        Ok(())
    }
}
