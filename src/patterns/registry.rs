//! 模式分类器
//!
//! 按注册顺序保存 PatternRule；classify 返回第一条命中的规则（注册顺序即优先级）。
//! 读多写少，使用 RwLock：分类期间允许其它步骤并发注册新规则。

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Local;

use crate::core::AutomationError;
use crate::patterns::{DefaultResponse, DetectionResult, PatternRule};

/// 模式注册表 + 分类器
#[derive(Debug, Default)]
pub struct PatternClassifier {
    rules: RwLock<Vec<PatternRule>>,
}

impl PatternClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<PatternRule>> {
        self.rules.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<PatternRule>> {
        self.rules.write().unwrap_or_else(|e| e.into_inner())
    }

    /// 编译并注册规则；返回 true 表示替换了同 id 的旧规则
    pub fn register_pattern<S: AsRef<str>>(
        &self,
        id: &str,
        expressions: &[S],
        response: DefaultResponse,
    ) -> Result<bool, AutomationError> {
        let rule = PatternRule::compile(id, expressions, response)?;
        Ok(self.register(rule))
    }

    /// 注册已编译的规则；同 id 原位替换（保留原优先级），否则追加到末尾
    pub fn register(&self, rule: PatternRule) -> bool {
        let mut rules = self.write();
        match rules.iter_mut().find(|r| r.id() == rule.id()) {
            Some(existing) => {
                tracing::debug!(pattern = %rule.id(), "replacing pattern rule");
                *existing = rule;
                true
            }
            None => {
                tracing::debug!(pattern = %rule.id(), "registering pattern rule");
                rules.push(rule);
                false
            }
        }
    }

    /// 第一条命中的规则胜出；未命中返回 None
    pub fn classify(&self, text: &str) -> Option<DetectionResult> {
        let rules = self.read();
        rules
            .iter()
            .find_map(|rule| detection(rule, text))
    }

    /// 返回所有命中的规则（按注册顺序），用于排查重叠的模式
    pub fn classify_all(&self, text: &str) -> Vec<DetectionResult> {
        let rules = self.read();
        rules.iter().filter_map(|rule| detection(rule, text)).collect()
    }

    pub fn pattern_ids(&self) -> Vec<String> {
        self.read().iter().map(|r| r.id().to_string()).collect()
    }

    pub fn get(&self, id: &str) -> Option<PatternRule> {
        self.read().iter().find(|r| r.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn detection(rule: &PatternRule, text: &str) -> Option<DetectionResult> {
    let (confidence, expr) = rule.evaluate(text)?;
    let key = &rule.response().key;
    Some(DetectionResult {
        pattern_id: rule.id().to_string(),
        confidence: confidence.clamp(0.0, 1.0),
        observed_text: text.to_string(),
        matched_expression: expr.to_string(),
        chosen_response_key: (!key.is_empty()).then(|| key.clone()),
        timestamp: Local::now(),
    })
}
