//! 内置对话/状态模式
//!
//! 游戏客户端常见的对话类型与成功标记，引擎构造时按优先级顺序注册。
//! 越具体的模式越靠前：例如 "mission complete" 必须排在 "mission" 相关提示之前。

use crate::core::AutomationError;
use crate::patterns::{DefaultResponse, PatternClassifier};

/// (id, 匹配表达式, 响应按键, 说明)；按键为空表示仅作状态标记
pub const BUILTIN_PATTERNS: &[(&str, &[&str], &str, &str)] = &[
    (
        "collect_trophy",
        &["collect trophy", r"trophy\s+available"],
        "f",
        "Collect the trophy",
    ),
    (
        "mission_complete",
        &["mission complete", "mission accomplished", "quest complete"],
        "",
        "Mission finished",
    ),
    (
        "mission_started",
        &["mission started", "quest started"],
        "",
        "Mission is active",
    ),
    (
        "accept_mission",
        &["accept mission", r"new (mission|quest)", r"\[1\]\s*accept"],
        "1",
        "Accept the offered mission",
    ),
    (
        "trade_offer",
        &["trade offer", r"\bbuy\b.*\bsell\b"],
        "2",
        "Open the trade window",
    ),
    (
        "repair_ship",
        &["repair ship", r"hull (integrity|damage)"],
        "r",
        "Repair the ship",
    ),
    (
        "ship_upgrade",
        &["upgrade available", r"upgrade (ship|hull|engine|cargo)"],
        "u",
        "Open ship upgrades",
    ),
    (
        "docking",
        &["request docking", r"dock(ing)? permission"],
        "g",
        "Request docking",
    ),
    (
        "continue_dialogue",
        &[r"press .{0,10}to continue", r"\bcontinue\b", r"\bnext\b"],
        "space",
        "Advance the dialogue",
    ),
];

/// 将内置模式注册到分类器
pub fn register_builtin(classifier: &PatternClassifier) -> Result<(), AutomationError> {
    for (id, expressions, key, description) in BUILTIN_PATTERNS {
        classifier.register_pattern(id, *expressions, DefaultResponse::new(*key, *description))?;
    }
    Ok(())
}
