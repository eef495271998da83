//! 屏幕文字来源：截图 + OCR（外部能力），以及测试用的脚本化实现

pub mod command;
pub mod scripted;
pub mod source;

pub use command::CommandTextSource;
pub use scripted::ScriptedTextSource;
pub use source::{ScreenRegion, TextSource};
