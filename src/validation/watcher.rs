//! 确认观察器：轮询屏幕文字，直到出现期望的子串或超时
//!
//! 超时是正常的否定结果而不是错误。等待期间的睡眠可被 CancellationToken 打断。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::validation::Clock;
use crate::vision::{ScreenRegion, TextSource};

/// 轮询间隔下限，避免零间隔在虚拟时钟下原地打转
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// 一次观察的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOutcome {
    pub success: bool,
    /// 最后一次读取到的文字（成功时即为包含标记的文字）
    pub last_text: String,
    /// 命中的标记
    pub matched: Option<String>,
    pub polls: u32,
    pub cancelled: bool,
}

impl WatchOutcome {
    fn trivially_satisfied() -> Self {
        Self {
            success: true,
            last_text: String::new(),
            matched: None,
            polls: 0,
            cancelled: false,
        }
    }
}

/// 大小写不敏感的包含判断；返回第一个命中的标记
pub fn find_marker<'a>(text: &str, markers: &'a [String]) -> Option<&'a str> {
    let haystack = text.to_lowercase();
    markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .find(|m| haystack.contains(&m.to_lowercase()))
}

/// 确认观察器
#[derive(Clone)]
pub struct ConfirmationWatcher {
    source: Arc<dyn TextSource>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl ConfirmationWatcher {
    pub fn new(source: Arc<dyn TextSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 轮询直到任一期望子串出现或超时；期望列表为空（或全为空白）时直接成功，不读取屏幕
    pub async fn watch(
        &self,
        expected: &[String],
        timeout: Duration,
        poll_interval: Duration,
        region: Option<&ScreenRegion>,
    ) -> WatchOutcome {
        if expected.iter().all(|m| m.trim().is_empty()) {
            return WatchOutcome::trivially_satisfied();
        }

        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        let start = self.clock.elapsed();
        let mut polls = 0u32;
        let mut last_text = String::new();

        loop {
            if self.cancel.is_cancelled() {
                return self.cancelled(last_text, polls);
            }

            last_text = match self.source.read_text(region).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "text source read failed, treating as empty");
                    String::new()
                }
            };
            polls += 1;
            tracing::debug!(poll = polls, text = %last_text, "watch poll");

            if let Some(marker) = find_marker(&last_text, expected) {
                return WatchOutcome {
                    success: true,
                    matched: Some(marker.to_string()),
                    last_text,
                    polls,
                    cancelled: false,
                };
            }

            if self.clock.elapsed().saturating_sub(start) >= timeout {
                return WatchOutcome {
                    success: false,
                    last_text,
                    matched: None,
                    polls,
                    cancelled: false,
                };
            }

            tokio::select! {
                _ = self.clock.sleep(poll_interval) => {}
                _ = self.cancel.cancelled() => return self.cancelled(last_text, polls),
            }
        }
    }

    fn cancelled(&self, last_text: String, polls: u32) -> WatchOutcome {
        tracing::info!(polls, "watch cancelled");
        WatchOutcome {
            success: false,
            last_text,
            matched: None,
            polls,
            cancelled: true,
        }
    }
}
