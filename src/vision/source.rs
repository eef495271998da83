//! 文字来源：截取屏幕区域并返回 OCR 识别结果
//!
//! 核心只把结果当作字符串做子串搜索，空字符串也是合法结果。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 屏幕区域（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// 文字来源 trait：region 为 None 时读取整个屏幕；可能较慢（OCR 延迟）
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn read_text(&self, region: Option<&ScreenRegion>) -> Result<String, String>;
}
