//! 输入层：动作类型、动作 trait 与输入驱动

pub mod action;
pub mod driver;

pub use action::{Action, ActionKind, DispatchAction};
pub use driver::{direction_key, CommandDriver, InputDriver, RecordingDriver};
