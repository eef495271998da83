//! 审计日志写入器
//!
//! 两个只追加文件：尝试日志（JSON Lines）与重试日志（逗号分隔文本）。
//! 写入失败只记录告警、计数，绝不影响自动化流程的成败。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::JournalSection;
use crate::core::AutomationError;
use crate::journal::{AttemptRecord, RetryLine};

/// 审计日志：并发写入通过互斥锁串行化，避免记录交错
#[derive(Debug)]
pub struct AuditJournal {
    attempt_path: PathBuf,
    retry_path: PathBuf,
    write_lock: Mutex<()>,
    failed_writes: AtomicUsize,
}

impl AuditJournal {
    /// 打开日志目录（不存在则创建）；目录无法创建是唯一向上传播的错误
    pub fn open(
        dir: impl AsRef<Path>,
        attempt_file: &str,
        retry_file: &str,
    ) -> Result<Self, AutomationError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            attempt_path: dir.join(attempt_file),
            retry_path: dir.join(retry_file),
            write_lock: Mutex::new(()),
            failed_writes: AtomicUsize::new(0),
        })
    }

    pub fn from_config(section: &JournalSection) -> Result<Self, AutomationError> {
        Self::open(&section.dir, &section.attempt_file, &section.retry_file)
    }

    pub fn attempt_path(&self) -> &Path {
        &self.attempt_path
    }

    pub fn retry_path(&self) -> &Path {
        &self.retry_path
    }

    /// 写入失败次数（尽力而为的写入被吞掉时递增）
    pub fn failed_writes(&self) -> usize {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// 追加一条尝试记录
    pub fn log_attempt(&self, record: &AttemptRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                self.report_failure(&self.attempt_path, &e.to_string());
                return;
            }
        };
        self.append(&self.attempt_path, &line);
    }

    /// 追加一行重试记录
    pub fn log_retry(&self, step_label: &str, attempt: u32, reason: &str) {
        let line = RetryLine::new(step_label, attempt, reason).to_line();
        self.append(&self.retry_path, &line);
    }

    fn append(&self, path: &Path, line: &str) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let result = ensure_dir(path).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut f| f.write_all(format!("{line}\n").as_bytes()))
        });
        if let Err(e) = result {
            self.report_failure(path, &e.to_string());
        }
    }

    fn report_failure(&self, path: &Path, err: &str) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(path = %path.display(), error = %err, "journal write failed");
    }

    /// 读取全部尝试记录（文件不存在时为空）；无法解析的行跳过
    pub fn read_attempts(&self) -> Result<Vec<AttemptRecord>, AutomationError> {
        Ok(read_lines(&self.attempt_path)?
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    pub fn read_retry_lines(&self) -> Result<Vec<RetryLine>, AutomationError> {
        Ok(read_lines(&self.retry_path)?
            .iter()
            .filter_map(|line| RetryLine::parse(line))
            .collect())
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(p) = path.parent() {
        std::fs::create_dir_all(p)?;
    }
    Ok(())
}

fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(std::fs::read_to_string(path)?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect())
}
