//! 步骤描述：调用方每次传入，不持久化

use std::time::Duration;

use crate::config::RetrySection;
use crate::input::ActionKind;
use crate::vision::ScreenRegion;

/// 一个步骤：一次期望的游戏动作及其确认、重试策略
#[derive(Debug, Clone, PartialEq)]
pub struct StepDescriptor {
    pub step_id: String,
    pub action: ActionKind,
    /// 成功标记；None 或空表示无需确认
    pub success_markers: Option<Vec<String>>,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// 单次尝试内的微重试次数（至少 1）
    pub max_attempts_within_call: u32,
    /// 执行失败时调用的回退动作
    pub fallback: Option<ActionKind>,
    /// OCR 读取区域；None 为整屏
    pub region: Option<ScreenRegion>,
    /// 覆盖引擎默认的确认超时
    pub timeout: Option<Duration>,
}

impl StepDescriptor {
    pub fn new(step_id: impl Into<String>, action: ActionKind) -> Self {
        let defaults = RetrySection::default();
        Self {
            step_id: step_id.into(),
            action,
            success_markers: None,
            max_retries: defaults.max_retries,
            retry_delay: Duration::from_millis(defaults.delay_ms),
            max_attempts_within_call: defaults.max_attempts_within_call,
            fallback: None,
            region: None,
            timeout: None,
        }
    }

    pub fn with_markers<S: Into<String>>(mut self, markers: impl IntoIterator<Item = S>) -> Self {
        self.success_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_retries(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = delay;
        self
    }

    pub fn with_attempts_within_call(mut self, attempts: u32) -> Self {
        self.max_attempts_within_call = attempts;
        self
    }

    pub fn with_fallback(mut self, fallback: ActionKind) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_region(mut self, region: ScreenRegion) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn markers(&self) -> &[String] {
        self.success_markers.as_deref().unwrap_or(&[])
    }

    pub fn requires_confirmation(&self) -> bool {
        self.markers().iter().any(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let step = StepDescriptor::new("talk", ActionKind::KeyPress { key: "e".into() });
        assert_eq!(step.max_retries, 3);
        assert_eq!(step.max_attempts_within_call, 1);
        assert!(!step.requires_confirmation());
        let step = step.with_markers(["mission started"]);
        assert!(step.requires_confirmation());
        assert_eq!(step.markers(), &["mission started".to_string()]);
    }
}
