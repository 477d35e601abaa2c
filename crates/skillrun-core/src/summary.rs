//! Final (or interim) report for a run. The shape of `report_fields` comes
//! from the target skill, so each orchestrator family keeps its own report.

use crate::registry::SkillRegistry;
use crate::run::WorkflowRun;
use crate::types::{RunMode, RunStatus, StepStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedStep {
    pub position: usize,
    pub skill: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub target: String,
    pub mode: RunMode,
    pub status: RunStatus,
    pub auto_accept: bool,
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
    pub pending: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<FailedStep>,
    pub checkpoints: usize,
    /// Completion detail per done skill.
    pub outputs: BTreeMap<String, String>,
    /// Fields the target's report is expected to fill.
    pub report_fields: Vec<String>,
}

impl RunSummary {
    pub fn new(run: &WorkflowRun, registry: &SkillRegistry) -> Self {
        let names = |status| -> Vec<String> {
            run.steps_with(status).map(|s| s.skill.clone()).collect()
        };

        // Only a halted run reports its failed step.
        let failed = run
            .current_step()
            .filter(|_| run.status == RunStatus::Halted)
            .filter(|s| s.error.is_some())
            .map(|s| FailedStep {
                position: s.position,
                skill: s.skill.clone(),
                reason: s.error.clone().unwrap_or_default(),
            });

        let outputs = run
            .steps_with(StepStatus::Done)
            .filter_map(|s| s.output.as_ref().map(|o| (s.skill.clone(), o.clone())))
            .collect();

        // A target removed from the project since the run started has no
        // report shape left.
        let report_fields = registry
            .resolve(&run.target)
            .map(|s| s.summary_fields.clone())
            .unwrap_or_default();

        Self {
            run_id: run.id.clone(),
            target: run.target.clone(),
            mode: run.mode,
            status: run.status,
            auto_accept: run.auto_accept,
            completed: names(StepStatus::Done),
            skipped: names(StepStatus::Skipped),
            pending: names(StepStatus::Pending),
            failed,
            checkpoints: run.pause_count(),
            outputs,
            report_fields,
        }
    }

    /// Human-readable rendering for the CLI.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Run:         {}\n", self.run_id));
        out.push_str(&format!("Target:      {} ({})\n", self.target, self.mode));
        out.push_str(&format!("Status:      {}\n", self.status));
        out.push_str(&format!(
            "Auto-accept: {}\n",
            if self.auto_accept { "on" } else { "off" }
        ));
        out.push_str(&format!("Checkpoints: {}\n", self.checkpoints));

        push_list(&mut out, "Completed", &self.completed);
        push_list(&mut out, "Skipped", &self.skipped);
        push_list(&mut out, "Pending", &self.pending);

        if let Some(ref f) = self.failed {
            out.push_str(&format!(
                "\nFailed: step {} ({}): {}\n",
                f.position, f.skill, f.reason
            ));
        }

        if !self.outputs.is_empty() {
            out.push_str("\nOutputs:\n");
            for (skill, detail) in &self.outputs {
                out.push_str(&format!("  {skill}: {detail}\n"));
            }
        }

        if !self.report_fields.is_empty() {
            out.push_str("\nReport fields:\n");
            for field in &self.report_fields {
                out.push_str(&format!("  - {field}\n"));
            }
        }

        out
    }
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{label} ({}):\n", items.len()));
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
