//! 模式规则：编译后的匹配表达式 + 默认响应
//!
//! 表达式在注册时一次性编译（大小写不敏感），非法表达式立即报错而不是在匹配时才暴露。

use chrono::{DateTime, Local};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::core::AutomationError;

/// 整段文字就是匹配内容
pub const EXACT_CONFIDENCE: f32 = 1.0;
/// 多词短语命中
pub const PHRASE_CONFIDENCE: f32 = 0.8;
/// 单个关键词命中
pub const KEYWORD_CONFIDENCE: f32 = 0.6;

/// 识别到某类对话后默认发送的按键及其说明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DefaultResponse {
    pub key: String,
    pub description: String,
}

impl DefaultResponse {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }

    /// 仅作状态标记、不需要响应的规则
    pub fn none(description: impl Into<String>) -> Self {
        Self::new("", description)
    }
}

/// 一条已编译的模式规则
#[derive(Debug, Clone)]
pub struct PatternRule {
    id: String,
    sources: Vec<String>,
    expressions: Vec<Regex>,
    response: DefaultResponse,
}

impl PatternRule {
    /// 编译规则；空白表达式会匹配任意文本，直接丢弃
    pub fn compile<S: AsRef<str>>(
        id: impl Into<String>,
        expressions: &[S],
        response: DefaultResponse,
    ) -> Result<Self, AutomationError> {
        let id = id.into();
        let mut sources = Vec::with_capacity(expressions.len());
        let mut compiled = Vec::with_capacity(expressions.len());
        for expr in expressions {
            let expr = expr.as_ref();
            if expr.trim().is_empty() {
                tracing::warn!(pattern = %id, "ignoring blank match expression");
                continue;
            }
            let regex = RegexBuilder::new(expr)
                .case_insensitive(true)
                .build()
                .map_err(|source| AutomationError::InvalidPattern {
                    id: id.clone(),
                    source,
                })?;
            sources.push(expr.to_string());
            compiled.push(regex);
        }
        Ok(Self {
            id,
            sources,
            expressions: compiled,
            response,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expressions(&self) -> &[String] {
        &self.sources
    }

    pub fn response(&self) -> &DefaultResponse {
        &self.response
    }

    /// 对文本求值：返回 (最佳置信度, 命中的表达式)；未命中返回 None
    pub(crate) fn evaluate(&self, text: &str) -> Option<(f32, &str)> {
        let whole = text.trim();
        let mut best: Option<(f32, &str)> = None;
        for (regex, source) in self.expressions.iter().zip(&self.sources) {
            // 跳过空匹配（如 `x*` 在开头匹配到空串），取第一个有内容的匹配
            let Some(found) = regex
                .find_iter(text)
                .find(|m| !m.as_str().trim().is_empty())
            else {
                continue;
            };
            let confidence = score(whole, found.as_str());
            if best.map_or(true, |(c, _)| confidence > c) {
                best = Some((confidence, source.as_str()));
            }
        }
        best
    }
}

/// 置信度随匹配具体程度单调递增：关键词 < 短语 < 整段
fn score(whole: &str, matched: &str) -> f32 {
    let matched = matched.trim();
    if matched.is_empty() {
        return 0.0;
    }
    if matched.to_lowercase() == whole.to_lowercase() {
        EXACT_CONFIDENCE
    } else if matched.split_whitespace().count() > 1 {
        PHRASE_CONFIDENCE
    } else {
        KEYWORD_CONFIDENCE
    }
}

/// 一次分类的结果；每次调用新建，不会被修改
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub pattern_id: String,
    pub confidence: f32,
    pub observed_text: String,
    pub matched_expression: String,
    pub chosen_response_key: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl DetectionResult {
    /// 置信度为 0 视为未命中，不得触发响应
    pub fn is_actionable(&self) -> bool {
        self.confidence > 0.0 && self.chosen_response_key.is_some()
    }
}

/// 时间戳不参与比较：同一文本对同一注册表的两次分类视为相同结果
impl PartialEq for DetectionResult {
    fn eq(&self, other: &Self) -> bool {
        self.pattern_id == other.pattern_id
            && self.confidence == other.confidence
            && self.observed_text == other.observed_text
            && self.matched_expression == other.matched_expression
            && self.chosen_response_key == other.chosen_response_key
    }
}
