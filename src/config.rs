//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `GLANCE__*` 覆盖（双下划线表示嵌套，如 `GLANCE__RETRY__MAX_RETRIES=5`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub journal: JournalSection,
    pub watcher: WatcherSection,
    pub retry: RetrySection,
    pub text_source: TextSourceSection,
    pub input: InputSection,
    /// 额外的模式规则，注册在内置规则之后（同 id 则替换内置规则）
    pub patterns: Vec<PatternSection>,
}

/// [journal] 段：审计日志目录与文件名
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalSection {
    pub dir: PathBuf,
    pub attempt_file: String,
    pub retry_file: String,
}

impl Default for JournalSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            attempt_file: "attempts.jsonl".to_string(),
            retry_file: "retry_log.txt".to_string(),
        }
    }
}

/// [watcher] 段：确认等待超时与轮询间隔（毫秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherSection {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WatcherSection {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            poll_interval_ms: 500,
        }
    }
}

impl WatcherSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// [retry] 段：步骤未声明时使用的默认重试策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_retries: u32,
    pub delay_ms: u64,
    /// 单次调用内的微重试次数（重新点击等）
    pub max_attempts_within_call: u32,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 2_000,
            max_attempts_within_call: 1,
        }
    }
}

/// [text_source] 段：截图与 OCR 命令
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextSourceSection {
    /// OCR 命令，`{image}` 为截图路径
    pub command: String,
    /// 截图命令；未设置时由 OCR 命令自行截图
    pub capture_command: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TextSourceSection {
    fn default() -> Self {
        Self {
            command: "tesseract {image} - 2>/dev/null".to_string(),
            capture_command: Some("import -window root {crop} {image}".to_string()),
            timeout_secs: 10,
        }
    }
}

/// [input] 段：按键模拟命令；enabled = false 时只记录不执行（演练）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputSection {
    pub enabled: bool,
    pub key_command: String,
    pub hold_command: String,
    pub type_command: String,
    pub timeout_secs: u64,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            enabled: false,
            key_command: "xdotool key {key}".to_string(),
            hold_command: "xdotool keydown {key} sleep {secs} keyup {key}".to_string(),
            type_command: "xdotool type '{text}'".to_string(),
            timeout_secs: 5,
        }
    }
}

/// [[patterns]] 条目
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSection {
    pub id: String,
    pub expressions: Vec<String>,
    #[serde(default)]
    pub response_key: String,
    #[serde(default)]
    pub response_description: String,
}

/// 从 config 目录加载配置，环境变量 GLANCE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 GLANCE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("GLANCE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
