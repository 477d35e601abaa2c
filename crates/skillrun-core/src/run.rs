//! `WorkflowRun`: the resumable state object returned to the driver after
//! every step. Persisted as YAML so a run can resume at any later time.

use crate::directive::Directive;
use crate::error::{Result, SkillrunError};
use crate::paths;
use crate::types::{RunMode, RunStatus, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// WorkflowStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// 1-based, strictly increasing across the run.
    pub position: usize,
    pub skill: String,
    pub status: StepStatus,
    /// Last dispatch failure. Cleared when the step completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowStep {
    pub fn new(position: usize, skill: impl Into<String>) -> Self {
        Self {
            position,
            skill: skill.into(),
            status: StepStatus::Pending,
            error: None,
            output: None,
            started_at: None,
            completed_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CheckpointRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Position of the last done step when the directive was given.
    pub after_position: Option<usize>,
    pub directive: Directive,
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// WorkflowRun
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: String,
    pub target: String,
    pub mode: RunMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
    pub steps: Vec<WorkflowStep>,
    /// Index into `steps` of the next step to execute; `steps.len()` when
    /// nothing is pending.
    pub current: usize,
    #[serde(default)]
    pub auto_accept: bool,
    pub status: RunStatus,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn new(
        target: impl Into<String>,
        mode: RunMode,
        user_input: Option<String>,
        skills: Vec<String>,
        auto_accept: bool,
    ) -> Self {
        let target = target.into();
        let suffix = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let steps: Vec<WorkflowStep> = skills
            .into_iter()
            .enumerate()
            .map(|(i, skill)| WorkflowStep::new(i + 1, skill))
            .collect();
        let status = if steps.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::Ready
        };

        Self {
            id: format!("{target}-{}", &suffix[..8]),
            target,
            mode,
            user_input,
            steps,
            current: 0,
            auto_accept,
            status,
            checkpoints: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.steps
            .get(self.current)
            .filter(|s| s.status == StepStatus::Pending)
    }

    pub fn steps_with(&self, status: StepStatus) -> impl Iterator<Item = &WorkflowStep> {
        self.steps.iter().filter(move |s| s.status == status)
    }

    pub fn has_pending(&self) -> bool {
        self.steps_with(StepStatus::Pending).next().is_some()
    }

    pub fn last_done_position(&self) -> Option<usize> {
        self.steps_with(StepStatus::Done).map(|s| s.position).last()
    }

    /// Number of times the run has paused for a directive.
    pub fn pause_count(&self) -> usize {
        self.checkpoints.len()
    }

    // -----------------------------------------------------------------------
    // Mutation helpers (used by the orchestrator only)
    // -----------------------------------------------------------------------

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Point `current` at the first pending step.
    pub(crate) fn sync_current(&mut self) {
        self.current = self
            .steps
            .iter()
            .position(|s| s.status == StepStatus::Pending)
            .unwrap_or(self.steps.len());
    }

    pub(crate) fn next_position(&self) -> usize {
        self.steps.last().map(|s| s.position + 1).unwrap_or(1)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let path = paths::run_file(root, id);
        if !path.exists() {
            return Err(SkillrunError::RunNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let run: WorkflowRun = serde_yaml::from_str(&data)?;
        Ok(run)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::run_file(root, &self.id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// All persisted runs, newest first.
    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let dir = paths::runs_dir(root);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut runs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let data = std::fs::read_to_string(&path)?;
            runs.push(serde_yaml::from_str::<WorkflowRun>(&data)?);
        }
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
