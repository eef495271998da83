//! 基于外部命令的文字来源：先截图，再调用 OCR 命令（默认 tesseract）
//!
//! 命令模板占位符：`{image}` 截图路径，`{x}` `{y}` `{w}` `{h}` 区域坐标，
//! `{crop}` 展开为 `-crop WxH+X+Y`（未指定区域时为空，即整屏）。
//! 命令经 `process::run_command` 执行，带超时。

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::TextSourceSection;
use crate::process::run_command;
use crate::vision::{ScreenRegion, TextSource};

/// 截图 + OCR 命令组合
pub struct CommandTextSource {
    capture_command: Option<String>,
    ocr_command: String,
    timeout: Duration,
    image_dir: PathBuf,
}

impl CommandTextSource {
    pub fn new(capture_command: Option<String>, ocr_command: String, timeout_secs: u64) -> Self {
        Self {
            capture_command,
            ocr_command,
            timeout: Duration::from_secs(timeout_secs),
            image_dir: std::env::temp_dir(),
        }
    }

    pub fn from_config(section: &TextSourceSection) -> Self {
        Self::new(
            section.capture_command.clone(),
            section.command.clone(),
            section.timeout_secs,
        )
    }

    /// 截图存放目录（默认系统临时目录）
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    fn image_path(&self) -> PathBuf {
        self.image_dir
            .join(format!("glance-{}.png", uuid::Uuid::new_v4()))
    }

    async fn capture_and_read(
        &self,
        image: &str,
        region: Option<&ScreenRegion>,
    ) -> Result<String, String> {
        if let Some(capture) = &self.capture_command {
            run_command(&render_template(capture, image, region), self.timeout).await?;
        }
        run_command(&render_template(&self.ocr_command, image, region), self.timeout).await
    }
}

/// 替换命令模板中的占位符
pub fn render_template(template: &str, image: &str, region: Option<&ScreenRegion>) -> String {
    let crop = region
        .map(|r| format!("-crop {}x{}+{}+{}", r.width, r.height, r.x, r.y))
        .unwrap_or_default();
    let mut out = template.replace("{image}", image).replace("{crop}", &crop);
    if let Some(r) = region {
        out = out
            .replace("{x}", &r.x.to_string())
            .replace("{y}", &r.y.to_string())
            .replace("{w}", &r.width.to_string())
            .replace("{h}", &r.height.to_string());
    }
    out
}

#[async_trait]
impl TextSource for CommandTextSource {
    async fn read_text(&self, region: Option<&ScreenRegion>) -> Result<String, String> {
        let image = self.image_path();
        let result = self
            .capture_and_read(&image.to_string_lossy(), region)
            .await;

        // 截图失败时也可能留下半写的文件
        if self.capture_command.is_some() {
            let _ = tokio::fs::remove_file(&image).await;
        }
        result.map(|text| text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_with_region() {
        let region = ScreenRegion::new(10, 20, 300, 40);
        let out = render_template(
            "import -window root -crop {w}x{h}+{x}+{y} {image}",
            "/tmp/a.png",
            Some(&region),
        );
        assert_eq!(out, "import -window root -crop 300x40+10+20 /tmp/a.png");
    }

    #[test]
    fn test_render_template_without_region() {
        let out = render_template("tesseract {image} -", "/tmp/b.png", None);
        assert_eq!(out, "tesseract /tmp/b.png -");
    }

    #[test]
    fn test_crop_placeholder() {
        let region = ScreenRegion::new(1, 2, 3, 4);
        let template = "import -window root {crop} {image}";
        assert_eq!(
            render_template(template, "/tmp/c.png", Some(&region)),
            "import -window root -crop 3x4+1+2 /tmp/c.png"
        );
        assert_eq!(
            render_template(template, "/tmp/c.png", None),
            "import -window root  /tmp/c.png"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_output_is_trimmed() {
        let source = CommandTextSource::new(None, "echo '  Mission Started  '".to_string(), 5);
        let text = source.read_text(None).await.unwrap();
        assert_eq!(text, "Mission Started");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_error() {
        let source = CommandTextSource::new(None, "exit 3".to_string(), 5);
        assert!(source.read_text(None).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_capture_removes_image() {
        let tmp = tempfile::tempdir().unwrap();
        let source = CommandTextSource::new(
            Some("touch {image}; exit 1".to_string()),
            "cat {image}".to_string(),
            5,
        )
        .with_image_dir(tmp.path());
        assert!(source.read_text(None).await.is_err());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_ocr_times_out() {
        let source = CommandTextSource::new(None, "sleep 30".to_string(), 1);
        let started = std::time::Instant::now();
        let err = source.read_text(None).await.unwrap_err();
        assert!(err.contains("timed out"));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
