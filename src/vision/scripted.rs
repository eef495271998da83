//! 脚本化文字来源（用于测试与演练，无需真实屏幕）
//!
//! 依次返回预设文本，用完后一直返回最后一条；可在运行中用 `show` 切换屏幕内容，
//! 模拟「动作执行后屏幕文字改变」。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::vision::{ScreenRegion, TextSource};

#[derive(Debug, Default)]
struct Screen {
    queued: VecDeque<String>,
    current: String,
}

/// 脚本化文字来源
#[derive(Debug, Default)]
pub struct ScriptedTextSource {
    screen: Mutex<Screen>,
    reads: AtomicUsize,
}

impl ScriptedTextSource {
    /// 始终返回同一段文字
    pub fn constant(text: impl Into<String>) -> Self {
        Self::sequence(vec![text.into()])
    }

    /// 按顺序返回，耗尽后保持最后一条
    pub fn sequence(texts: Vec<String>) -> Self {
        Self {
            screen: Mutex::new(Screen {
                queued: texts.into(),
                current: String::new(),
            }),
            reads: AtomicUsize::new(0),
        }
    }

    /// 立即替换屏幕内容（清空尚未读取的队列）
    pub fn show(&self, text: impl Into<String>) {
        let mut screen = self.screen.lock().unwrap_or_else(|e| e.into_inner());
        screen.queued.clear();
        screen.current = text.into();
    }

    /// 已读取次数
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextSource for ScriptedTextSource {
    async fn read_text(&self, _region: Option<&ScreenRegion>) -> Result<String, String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut screen = self.screen.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = screen.queued.pop_front() {
            screen.current = next;
        }
        Ok(screen.current.clone())
    }
}
