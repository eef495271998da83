//! 引擎构建器：统一的 AutomationEngine 初始化逻辑
//!
//! 配置驱动（from_config）与测试（手动注入文字来源 / 时钟）共用同一条构建路径。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, PatternSection, WatcherSection};
use crate::core::{AutomationEngine, AutomationError};
use crate::input::{CommandDriver, InputDriver, RecordingDriver};
use crate::journal::AuditJournal;
use crate::patterns::{register_builtin, DefaultResponse, PatternClassifier};
use crate::validation::{Clock, TokioClock};
use crate::vision::{CommandTextSource, TextSource};

/// 引擎构建器
pub struct EngineBuilder {
    journal: AuditJournal,
    source: Arc<dyn TextSource>,
    driver: Arc<dyn InputDriver>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    timeout: Duration,
    poll_interval: Duration,
    builtin_patterns: bool,
    patterns: Vec<PatternSection>,
}

impl EngineBuilder {
    /// 默认：真实时钟、演练驱动、内置模式、[watcher] 默认时序
    pub fn new(journal: AuditJournal, source: Arc<dyn TextSource>) -> Self {
        let watcher = WatcherSection::default();
        Self {
            journal,
            source,
            driver: Arc::new(RecordingDriver::new()),
            clock: Arc::new(TokioClock::new()),
            cancel: CancellationToken::new(),
            timeout: watcher.timeout(),
            poll_interval: watcher.poll_interval(),
            builtin_patterns: true,
            patterns: Vec::new(),
        }
    }

    /// 按配置创建：日志目录、OCR 命令、输入命令（未启用则演练）、额外模式
    pub fn from_config(config: &AppConfig) -> Result<Self, AutomationError> {
        let journal = AuditJournal::from_config(&config.journal)?;
        let source = Arc::new(CommandTextSource::from_config(&config.text_source));
        let driver: Arc<dyn InputDriver> = if config.input.enabled {
            Arc::new(CommandDriver::from_config(&config.input))
        } else {
            tracing::info!("input disabled, dispatching in dry-run mode");
            Arc::new(RecordingDriver::new())
        };
        Ok(Self::new(journal, source)
            .with_driver(driver)
            .with_watch_timing(config.watcher.timeout(), config.watcher.poll_interval())
            .with_patterns(config.patterns.clone()))
    }

    pub fn with_driver(mut self, driver: Arc<dyn InputDriver>) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_watch_timing(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    /// 是否注册内置对话模式
    pub fn with_builtin_patterns(mut self, enable: bool) -> Self {
        self.builtin_patterns = enable;
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<PatternSection>) -> Self {
        self.patterns = patterns;
        self
    }

    /// 构建引擎；任一模式表达式非法即失败
    pub fn build(self) -> Result<AutomationEngine, AutomationError> {
        let classifier = PatternClassifier::new();
        if self.builtin_patterns {
            register_builtin(&classifier)?;
        }
        for p in &self.patterns {
            classifier.register_pattern(
                &p.id,
                p.expressions.as_slice(),
                DefaultResponse::new(p.response_key.as_str(), p.response_description.as_str()),
            )?;
        }
        tracing::info!(patterns = classifier.len(), "automation engine ready");

        Ok(AutomationEngine {
            classifier: Arc::new(classifier),
            journal: Arc::new(self.journal),
            source: self.source,
            driver: self.driver,
            clock: self.clock,
            cancel: self.cancel,
            timeout: self.timeout,
            poll_interval: self.poll_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::BUILTIN_PATTERNS;
    use crate::vision::ScriptedTextSource;

    fn journal(tmp: &tempfile::TempDir) -> AuditJournal {
        AuditJournal::open(tmp.path(), "a.jsonl", "r.txt").unwrap()
    }

    #[test]
    fn test_config_patterns_override_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = EngineBuilder::new(journal(&tmp), Arc::new(ScriptedTextSource::default()))
            .with_patterns(vec![
                PatternSection {
                    id: "collect_trophy".into(),
                    expressions: vec!["claim prize".into()],
                    response_key: "c".into(),
                    response_description: String::new(),
                },
                PatternSection {
                    id: "salvage".into(),
                    expressions: vec!["salvage available".into()],
                    response_key: "e".into(),
                    response_description: String::new(),
                },
            ])
            .build()
            .unwrap();
        assert_eq!(engine.classifier().len(), BUILTIN_PATTERNS.len() + 1);
        let result = engine.classify("Claim Prize").unwrap();
        assert_eq!(result.pattern_id, "collect_trophy");
        assert_eq!(result.chosen_response_key.as_deref(), Some("c"));
    }

    #[test]
    fn test_invalid_config_pattern_fails_build() {
        let tmp = tempfile::tempdir().unwrap();
        let result = EngineBuilder::new(journal(&tmp), Arc::new(ScriptedTextSource::default()))
            .with_builtin_patterns(false)
            .with_patterns(vec![PatternSection {
                id: "broken".into(),
                expressions: vec!["(".into()],
                response_key: String::new(),
                response_description: String::new(),
            }])
            .build();
        assert!(matches!(result, Err(AutomationError::InvalidPattern { .. })));
    }

    #[test]
    fn test_from_config_creates_journal_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.journal.dir = tmp.path().join("nested").join("logs");
        let engine = EngineBuilder::from_config(&config).unwrap().build().unwrap();
        assert!(tmp.path().join("nested").join("logs").is_dir());
        assert_eq!(engine.classifier().len(), BUILTIN_PATTERNS.len());
    }
}
