//! 步骤计划：从 TOML 文件加载一组 StepDescriptor
//!
//! 未填写的重试参数使用配置中的 [retry] 默认值。

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::RetrySection;
use crate::core::AutomationError;
use crate::input::ActionKind;
use crate::validation::StepDescriptor;
use crate::vision::ScreenRegion;

#[derive(Debug, Clone, Deserialize)]
pub struct StepPlan {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub action: ActionKind,
    #[serde(default)]
    pub markers: Option<Vec<String>>,
    pub max_retries: Option<u32>,
    pub delay_ms: Option<u64>,
    pub attempts_within_call: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub region: Option<ScreenRegion>,
    pub fallback: Option<ActionKind>,
}

impl PlanStep {
    pub fn into_descriptor(self, defaults: &RetrySection) -> StepDescriptor {
        StepDescriptor {
            step_id: self.id,
            action: self.action,
            success_markers: self.markers,
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: Duration::from_millis(self.delay_ms.unwrap_or(defaults.delay_ms)),
            max_attempts_within_call: self
                .attempts_within_call
                .unwrap_or(defaults.max_attempts_within_call),
            fallback: self.fallback,
            region: self.region,
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

impl StepPlan {
    pub fn parse(raw: &str) -> Result<Self, AutomationError> {
        let plan: StepPlan = toml::from_str(raw).map_err(|e| AutomationError::Plan(e.to_string()))?;
        if let Some(step) = plan.steps.iter().find(|s| s.id.trim().is_empty()) {
            return Err(AutomationError::Plan(format!(
                "step with action '{}' has an empty id",
                step.action
            )));
        }
        Ok(plan)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AutomationError::Plan(format!("{}: {}", path.display(), e)))?;
        Self::parse(&raw)
    }

    pub fn into_descriptors(self, defaults: &RetrySection) -> Vec<StepDescriptor> {
        self.steps
            .into_iter()
            .map(|s| s.into_descriptor(defaults))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
[[steps]]
id = "accept_mission"
markers = ["mission started"]
max_retries = 2
attempts_within_call = 2
region = { x = 0, y = 600, width = 800, height = 120 }
action = { kind = "dialogue_choice", key = "1" }
fallback = { kind = "key_press", key = "Escape" }

[[steps]]
id = "fly_to_gate"
action = { kind = "move", direction = "forward", duration_ms = 3000 }
"#;

    #[test]
    fn test_parse_plan_with_defaults() {
        let defaults = RetrySection::default();
        let steps = StepPlan::parse(PLAN).unwrap().into_descriptors(&defaults);
        assert_eq!(steps.len(), 2);

        let accept = &steps[0];
        assert_eq!(accept.max_retries, 2);
        assert_eq!(accept.retry_delay, Duration::from_millis(defaults.delay_ms));
        assert_eq!(accept.max_attempts_within_call, 2);
        assert_eq!(accept.region, Some(ScreenRegion::new(0, 600, 800, 120)));
        assert_eq!(
            accept.fallback,
            Some(ActionKind::KeyPress { key: "Escape".into() })
        );

        let fly = &steps[1];
        assert!(!fly.requires_confirmation());
        assert_eq!(fly.max_retries, defaults.max_retries);
    }

    #[test]
    fn test_empty_id_rejected() {
        let err = StepPlan::parse(
            r#"
[[steps]]
id = " "
action = { kind = "key_press", key = "e" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AutomationError::Plan(_)));
    }

    #[test]
    fn test_unknown_action_kind_rejected() {
        let err = StepPlan::parse(
            r#"
[[steps]]
id = "x"
action = { kind = "teleport" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AutomationError::Plan(_)));
    }
}
