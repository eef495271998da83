//! 自动化引擎集成测试：通过公共 API 覆盖确认、重试、回退与审计日志

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glance::input::{ActionKind, RecordingDriver};
use glance::journal::{AttemptOutcome, AuditJournal};
use glance::patterns::DefaultResponse;
use glance::validation::{ManualClock, RetryState, StepDescriptor, StepPlan};
use glance::vision::ScriptedTextSource;
use glance::{AutomationEngine, EngineBuilder};

struct Fixture {
    engine: AutomationEngine,
    source: Arc<ScriptedTextSource>,
    driver: Arc<RecordingDriver>,
    dir: tempfile::TempDir,
}

fn fixture(screen: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedTextSource::constant(screen));
    let driver = Arc::new(RecordingDriver::new());
    let journal =
        AuditJournal::open(dir.path().join("logs"), "attempts.jsonl", "retry_log.txt").unwrap();
    let engine = EngineBuilder::new(journal, source.clone())
        .with_driver(driver.clone())
        .with_clock(Arc::new(ManualClock::new()))
        .with_watch_timing(Duration::from_secs(3), Duration::from_millis(500))
        .build()
        .unwrap();
    Fixture {
        engine,
        source,
        driver,
        dir,
    }
}

fn retry_file_lines(f: &Fixture) -> Vec<String> {
    let path = f.dir.path().join("logs").join("retry_log.txt");
    if !path.exists() {
        return Vec::new();
    }
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn mission_started_confirms_with_single_journal_entry() {
    let f = fixture("mission started");
    let action = || -> Result<(), String> { Ok(()) };
    let outcome = f
        .engine
        .run_validated("start", &action, &["mission started".to_string()], 1)
        .await
        .unwrap();
    assert!(outcome.confirmed);

    let records = f.engine.journal().read_attempts().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].success);
    assert_eq!(records[0].observed_text.as_deref(), Some("mission started"));
}

#[tokio::test]
async fn unmatched_text_with_two_retries_writes_two_lines() {
    let f = fixture("no match");
    let step = StepDescriptor::new("expect", ActionKind::KeyPress { key: "e".into() })
        .with_markers(["expected"])
        .with_retries(2, Duration::from_millis(100));
    let report = f.engine.run_step(&step).await;

    assert!(!report.success);
    assert_eq!(report.state, RetryState::Failed);
    assert_eq!(report.attempts, 2);

    let lines = retry_file_lines(&f);
    assert_eq!(lines.len(), 2);
    for (i, line) in lines.iter().enumerate() {
        let fields: Vec<&str> = line.splitn(4, ',').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1], "expect");
        assert_eq!(fields[2], (i + 1).to_string());
    }
}

#[tokio::test]
async fn first_try_success_leaves_retry_log_absent() {
    let f = fixture("Trade window open");
    let step = StepDescriptor::new("trade", ActionKind::DialogueChoice { key: "2".into() })
        .with_markers(["trade window"])
        .with_retries(4, Duration::from_secs(1));
    let report = f.engine.run_step(&step).await;
    assert!(report.success);
    assert_eq!(report.attempts, 1);
    assert!(retry_file_lines(&f).is_empty());
    assert_eq!(f.driver.dispatched().len(), 1);
}

#[tokio::test]
async fn confirmation_on_third_attempt() {
    let f = fixture("hangar");
    let calls = AtomicU32::new(0);
    let source = f.source.clone();
    let action = || -> Result<(), String> {
        if calls.fetch_add(1, Ordering::SeqCst) == 2 {
            source.show("Upgrade installed");
        }
        Ok(())
    };
    let step = StepDescriptor::new("upgrade", ActionKind::KeyPress { key: "u".into() })
        .with_markers(["upgrade installed"])
        .with_retries(5, Duration::from_millis(200));
    let report = f.engine.execute_with_retry(&step, &action, None).await;
    assert!(report.success);
    assert_eq!(report.attempts, 3);
    assert_eq!(retry_file_lines(&f).len(), 2);

    let records = f.engine.journal().read_attempts().unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.run_id == Some(report.run_id)));
    let attempts: Vec<u32> = records.iter().map(|r| r.attempt).collect();
    assert_eq!(attempts, vec![1, 2, 3]);
}

#[tokio::test]
async fn fallback_rescues_exhausted_step_once() {
    let f = fixture("no match");
    let action = || -> Result<(), String> { Ok(()) };
    let invoked = AtomicU32::new(0);
    let fallback = |_: &StepDescriptor| -> Result<bool, String> {
        invoked.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    };
    let step = StepDescriptor::new("repair", ActionKind::KeyPress { key: "r".into() })
        .with_markers(["repaired"])
        .with_retries(3, Duration::from_millis(100));
    let report = f
        .engine
        .execute_with_retry(&step, &action, Some(&fallback))
        .await;
    assert!(report.success);
    assert_eq!(report.state, RetryState::FallbackInvoked { result: true });
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(retry_file_lines(&f).len(), 3);
}

#[tokio::test]
async fn failing_action_is_contained() {
    let f = fixture("expected");
    let action = || -> Result<(), String> { Err("xdotool not installed".into()) };
    let step = StepDescriptor::new("press", ActionKind::KeyPress { key: "e".into() })
        .with_markers(["expected"])
        .with_retries(2, Duration::from_millis(10));
    let report = f.engine.execute_with_retry(&step, &action, None).await;
    assert!(!report.success);

    let records = f.engine.journal().read_attempts().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.outcome == AttemptOutcome::FailureError));
    assert!(retry_file_lines(&f)
        .iter()
        .all(|l| l.ends_with("xdotool not installed")));
}

#[tokio::test]
async fn runtime_registration_changes_classification() {
    let f = fixture("");
    assert!(f.engine.classify("Salvage available nearby").is_none());
    f.engine
        .register_pattern(
            "salvage",
            &["salvage available"],
            DefaultResponse::new("e", "Salvage"),
        )
        .unwrap();
    let detection = f.engine.classify("Salvage available nearby").unwrap();
    assert_eq!(detection.pattern_id, "salvage");

    let replaced = f
        .engine
        .register_pattern("salvage", &["wreckage"], DefaultResponse::new("e", "Salvage"))
        .unwrap();
    assert!(replaced);
    assert!(f.engine.classify("Salvage available nearby").is_none());
    let ids = f.engine.classifier().pattern_ids();
    assert_eq!(ids.iter().filter(|id| *id == "salvage").count(), 1);
}

#[tokio::test]
async fn plan_steps_run_through_driver() {
    let f = fixture("Docking permission granted. Docked.");
    let steps = StepPlan::parse(
        r#"
[[steps]]
id = "request_docking"
markers = ["docked"]
max_retries = 1
action = { kind = "key_press", key = "g" }

[[steps]]
id = "walk_to_bar"
action = { kind = "move", direction = "forward", duration_ms = 800 }
"#,
    )
    .unwrap()
    .into_descriptors(&Default::default());

    let reports = f.engine.run_all(&steps).await;
    assert!(reports.iter().all(|r| r.success));
    assert_eq!(f.driver.dispatched().len(), 2);
}

#[tokio::test]
async fn cancelled_engine_sends_no_input() {
    let f = fixture("no match");
    let step = StepDescriptor::new("wait", ActionKind::KeyPress { key: "e".into() })
        .with_markers(["never"])
        .with_retries(10, Duration::from_secs(1))
        .with_fallback(ActionKind::KeyPress { key: "Escape".into() });
    f.engine.cancellation_token().cancel();
    let report = f.engine.run_step(&step).await;
    assert!(report.cancelled);
    assert!(!report.success);
    assert_eq!(report.attempts, 0);
    assert!(!report.fallback_invoked);
    assert!(f.driver.dispatched().is_empty());
    assert!(f.engine.journal().read_attempts().unwrap().is_empty());
    assert!(retry_file_lines(&f).is_empty());
}

#[tokio::test]
async fn unwritable_journal_does_not_change_outcomes() {
    let f = fixture("Docked at Station");
    // 目标文件路径被目录占用，所有写入都会失败
    std::fs::create_dir_all(f.engine.journal().attempt_path()).unwrap();
    std::fs::create_dir_all(f.engine.journal().retry_path()).unwrap();

    let confirmed = StepDescriptor::new("dock", ActionKind::KeyPress { key: "g".into() })
        .with_markers(["docked"])
        .with_retries(3, Duration::from_millis(100));
    let exhausted = StepDescriptor::new("trade", ActionKind::KeyPress { key: "2".into() })
        .with_markers(["trade window"])
        .with_retries(2, Duration::from_millis(100));

    let ok = f.engine.run_step(&confirmed).await;
    let bad = f.engine.run_step(&exhausted).await;

    assert!(ok.success);
    assert_eq!(ok.state, RetryState::Succeeded);
    assert!(!bad.success);
    assert_eq!(bad.state, RetryState::Failed);
    assert_eq!(bad.attempts, 2);
    // 1 条确认记录 + 2 条失败记录 + 2 行重试日志
    assert_eq!(f.engine.journal().failed_writes(), 5);
}
