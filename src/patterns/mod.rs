//! 模式分类：将 OCR 识别出的文字归类为对话类型 / 状态标记

pub mod builtin;
pub mod registry;
pub mod rule;

pub use builtin::{register_builtin, BUILTIN_PATTERNS};
pub use registry::PatternClassifier;
pub use rule::{
    DefaultResponse, DetectionResult, PatternRule, EXACT_CONFIDENCE, KEYWORD_CONFIDENCE,
    PHRASE_CONFIDENCE,
};
