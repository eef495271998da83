//! 外部命令执行：截图 / OCR / 按键模拟共用
//!
//! 通过 sh -c（Windows 为 cmd /C）执行，带超时；超时或调用方放弃等待时子进程随之被杀掉。

use std::time::Duration;

use tokio::process::Command;

/// 执行命令并返回 stdout；非零退出码视为失败
pub async fn run_command(command: &str, timeout: Duration) -> Result<String, String> {
    tracing::debug!(command = %command, "running command");

    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };
    cmd.kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| format!("Command timed out after {}s", timeout.as_secs()))?
        .map_err(|e| format!("Execution failed: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("Exit {:?}\nstderr: {}", output.status, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
