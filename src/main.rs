//! Glance - 基于屏幕文字确认的游戏自动化引擎
//!
//! 入口：初始化日志、加载配置与步骤计划，依次执行每个步骤并输出结果。
//! 用法：`glance <plan.toml> [config.toml]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use glance::config::load_config;
use glance::core::{EngineBuilder, ShutdownManager};
use glance::observability;
use glance::validation::StepPlan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    observability::init();

    let mut args = std::env::args().skip(1);
    let plan_path = args
        .next()
        .context("usage: glance <plan.toml> [config.toml]")?;
    let config_path = args.next().map(PathBuf::from);

    let config = load_config(config_path).context("Failed to load config")?;
    let steps = StepPlan::load(&plan_path)
        .with_context(|| format!("Failed to load plan {plan_path}"))?
        .into_descriptors(&config.retry);

    // Ctrl+C / SIGTERM 取消正在进行的等待
    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let engine = EngineBuilder::from_config(&config)
        .context("Failed to open journal")?
        .with_cancellation(shutdown.token())
        .build()
        .context("Failed to build automation engine")?;

    let mut failed = 0usize;
    for step in &steps {
        if shutdown.is_shutdown() {
            tracing::info!(step = %step.step_id, "skipping remaining steps after shutdown");
            break;
        }
        let report = engine.run_step(step).await;
        println!(
            "{} {} attempts={} state={:?}",
            if report.success { "OK  " } else { "FAIL" },
            report.step_id,
            report.attempts,
            report.state
        );
        if !report.success {
            failed += 1;
        }
    }

    if let Some(reason) = shutdown.reason() {
        eprintln!("stopped early: {reason}");
        tracing::warn!(reason = %reason, "automation stopped before all steps finished");
    }
    if engine.journal().failed_writes() > 0 {
        tracing::warn!(
            failed_writes = engine.journal().failed_writes(),
            "some journal records could not be written"
        );
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} step(s) failed", steps.len());
    }
    Ok(())
}
