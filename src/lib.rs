//! Glance - 基于屏幕文字确认的游戏自动化引擎
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、AutomationEngine 上下文与构建器、停止信号
//! - **input**: 动作类型与输入驱动（外部命令 / 演练记录）
//! - **journal**: 只追加的尝试日志与重试日志
//! - **observability**: tracing 初始化
//! - **patterns**: 对话/状态模式注册表与分类器
//! - **process**: 外部命令执行（超时即终止子进程）
//! - **validation**: 确认观察器、带确认的步骤执行器、重试编排器、步骤计划
//! - **vision**: 屏幕文字来源（截图 + OCR）

pub mod config;
pub mod core;
pub mod input;
pub mod journal;
pub mod observability;
pub mod patterns;
pub mod process;
pub mod validation;
pub mod vision;

pub use crate::core::{AutomationEngine, AutomationError, EngineBuilder};
pub use validation::{RunReport, StepDescriptor};
