//! 时钟抽象：轮询循环通过它取时间与睡眠，测试可用虚拟时间代替真实等待

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

#[async_trait]
pub trait Clock: Send + Sync {
    /// 自时钟创建以来经过的时间（单调）
    fn elapsed(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// 真实时钟：tokio::time::sleep
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 虚拟时钟：sleep 立即返回并推进时间（用于测试）
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
    sleeps: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        // 饱和相加，超大时长不回绕
        let _ = self
            .now_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(ms))
            });
    }

    /// sleep 被调用的次数
    pub fn sleeps(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_millis(250)).await;
        clock.sleep(Duration::from_secs(1)).await;
        assert_eq!(clock.elapsed(), Duration::from_millis(1250));
        assert_eq!(clock.sleeps(), 2);
    }

    #[test]
    fn test_manual_clock_saturates() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(10));
        clock.advance(Duration::MAX);
        assert_eq!(clock.elapsed(), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn test_tokio_clock_is_monotonic() {
        let clock = TokioClock::new();
        let a = clock.elapsed();
        clock.sleep(Duration::from_millis(5)).await;
        assert!(clock.elapsed() >= a + Duration::from_millis(5));
    }
}
