//! 核心层：错误类型、引擎上下文与构建器、停止信号

pub mod builder;
pub mod engine;
pub mod error;
pub mod shutdown;

pub use builder::EngineBuilder;
pub use engine::AutomationEngine;
pub use error::AutomationError;
pub use shutdown::{ShutdownManager, ShutdownReason};
