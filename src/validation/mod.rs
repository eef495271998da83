//! 屏幕确认执行：时钟、确认观察器、带确认的步骤执行器、重试编排器、步骤计划

pub mod clock;
pub mod executor;
pub mod plan;
pub mod retry;
pub mod step;
pub mod watcher;

pub use clock::{Clock, ManualClock, TokioClock};
pub use executor::{ValidatedStepExecutor, ValidationOutcome, ValidationRequest};
pub use plan::{PlanStep, StepPlan};
pub use retry::{Fallback, RetryOrchestrator, RetryState, RunReport};
pub use step::StepDescriptor;
pub use watcher::{find_marker, ConfirmationWatcher, WatchOutcome};
