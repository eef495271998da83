//! 审计日志：尝试日志（每次确认结果）与重试日志（每次失败重试）

pub mod record;
pub mod writer;

pub use record::{AttemptOutcome, AttemptRecord, RetryLine};
pub use writer::AuditJournal;
