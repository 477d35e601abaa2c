//! Linear, checkpoint-gated execution of an orchestrator skill's sub-skills.
//!
//! The orchestrator never blocks for user input. `advance` runs one step and
//! returns; if the run then needs direction its status is
//! `awaiting_checkpoint` (or `halted` after a failure) and the driver calls
//! `checkpoint` whenever the user answers.
//!
//! ```text
//! start ──► ready ──advance──► awaiting_checkpoint ──checkpoint──► ready ─► …
//!             │                       │
//!             │ (dispatch error)      └─(abort)──► aborted
//!             ▼
//!           halted ──checkpoint──► ready | aborted
//!
//! last pending step done ──► completed
//! ```

use crate::config::RunsConfig;
use crate::directive::Directive;
use crate::dispatch::{Dispatcher, InvocationContext};
use crate::error::{Result, SkillrunError};
use crate::gate::{CheckpointGate, GateDecision};
use crate::registry::SkillRegistry;
use crate::run::{CheckpointRecord, WorkflowRun, WorkflowStep};
use crate::types::{RunMode, RunStatus, StepStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// StepResult
// ---------------------------------------------------------------------------

/// Outcome of one successful `advance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub run_id: String,
    pub position: usize,
    pub skill: String,
    pub detail: String,
    /// The run is now waiting at a checkpoint.
    pub paused: bool,
    /// No pending steps remain.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a> {
    registry: &'a SkillRegistry,
    targeted_mode: bool,
    default_auto_accept: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a SkillRegistry) -> Self {
        Self {
            registry,
            targeted_mode: true,
            default_auto_accept: false,
        }
    }

    pub fn with_config(registry: &'a SkillRegistry, runs: &RunsConfig) -> Self {
        Self {
            registry,
            targeted_mode: runs.targeted_mode,
            default_auto_accept: runs.auto_accept,
        }
    }

    // -----------------------------------------------------------------------
    // start
    // -----------------------------------------------------------------------

    /// Build a run for `target`. When `user_input` names exactly one
    /// sub-skill the run collapses to that single step. A leaf target runs as
    /// a single step of itself.
    pub fn start(&self, target: &str, user_input: Option<&str>) -> Result<WorkflowRun> {
        let skill = self.registry.resolve(target)?;
        let deps = self.registry.dependencies_of(target)?;

        let targeted = match user_input {
            Some(input) if self.targeted_mode && !deps.is_empty() => {
                self.registry.match_concern(target, input)?
            }
            _ => None,
        };

        let (mode, skills) = match targeted {
            Some(hit) => (RunMode::Targeted, vec![hit.name.clone()]),
            None if deps.is_empty() => (RunMode::Full, vec![skill.name.clone()]),
            None => (
                RunMode::Full,
                deps.iter().map(|s| s.name.clone()).collect(),
            ),
        };

        let run = WorkflowRun::new(
            target,
            mode,
            user_input.map(str::to_string),
            skills,
            self.default_auto_accept,
        );
        info!(
            "started run {} for {target} ({mode}, {} steps)",
            run.id,
            run.steps.len()
        );
        Ok(run)
    }

    // -----------------------------------------------------------------------
    // advance
    // -----------------------------------------------------------------------

    /// Execute the current pending step. On success the step is `done` and
    /// the run pauses at a checkpoint unless auto-accept is on or nothing is
    /// left. On failure the step stays `pending` with its error recorded, the
    /// run is `halted`, and the error is returned.
    pub fn advance(
        &self,
        run: &mut WorkflowRun,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<StepResult> {
        match run.status {
            RunStatus::Ready => {}
            RunStatus::AwaitingCheckpoint => {
                return Err(SkillrunError::CheckpointPending(run.id.clone()))
            }
            RunStatus::Halted => {
                let (position, skill) = run
                    .current_step()
                    .map(|s| (s.position, s.skill.clone()))
                    .unwrap_or_default();
                return Err(SkillrunError::RunHalted {
                    run: run.id.clone(),
                    position,
                    skill,
                });
            }
            RunStatus::Completed | RunStatus::Aborted => {
                return Err(SkillrunError::RunClosed {
                    run: run.id.clone(),
                    status: run.status.to_string(),
                })
            }
        }

        run.sync_current();
        let index = run.current;
        let Some(step) = run.steps.get(index) else {
            run.status = RunStatus::Completed;
            run.touch();
            return Err(SkillrunError::RunClosed {
                run: run.id.clone(),
                status: run.status.to_string(),
            });
        };
        let position = step.position;
        let skill_name = step.skill.clone();

        let skill = match self.registry.resolve(&skill_name) {
            Ok(skill) => skill,
            Err(e) => {
                self.halt(run, index, e.to_string());
                return Err(e);
            }
        };

        {
            let step = &mut run.steps[index];
            step.status = StepStatus::Active;
            step.started_at = Some(Utc::now());
        }
        debug!("run {}: step {position} ({skill_name}) active", run.id);

        let outcome = {
            let ctx = InvocationContext {
                run_id: &run.id,
                target: &run.target,
                position,
                total: run.steps.len(),
                user_input: run.user_input.as_deref(),
            };
            dispatcher.invoke(skill, &ctx)
        };

        let signal = match outcome {
            Ok(signal) => signal,
            Err(source) => {
                self.halt(run, index, source.to_string());
                return Err(SkillrunError::Dispatch {
                    skill: skill_name,
                    position,
                    source,
                });
            }
        };

        {
            let step = &mut run.steps[index];
            step.status = StepStatus::Done;
            step.error = None;
            step.output = Some(signal.detail.clone());
            step.completed_at = Some(Utc::now());
        }
        run.sync_current();

        let finished = !run.has_pending();
        run.status = if finished {
            RunStatus::Completed
        } else if run.auto_accept {
            RunStatus::Ready
        } else {
            RunStatus::AwaitingCheckpoint
        };
        run.touch();

        if finished {
            info!("run {} completed", run.id);
        } else {
            debug!("run {}: step {position} ({skill_name}) done, now {}", run.id, run.status);
        }

        Ok(StepResult {
            run_id: run.id.clone(),
            position,
            skill: skill_name,
            detail: signal.detail,
            paused: run.status == RunStatus::AwaitingCheckpoint,
            finished,
        })
    }

    fn halt(&self, run: &mut WorkflowRun, index: usize, reason: String) {
        let step = &mut run.steps[index];
        warn!(
            "run {}: step {} ({}) failed: {reason}",
            run.id, step.position, step.skill
        );
        step.status = StepStatus::Pending;
        step.error = Some(reason);
        run.status = RunStatus::Halted;
        run.touch();
    }

    // -----------------------------------------------------------------------
    // checkpoint
    // -----------------------------------------------------------------------

    /// Evaluate `directive` at the pending checkpoint (or halt) and apply the
    /// decision. A rejected directive leaves the run untouched.
    pub fn checkpoint(&self, run: &mut WorkflowRun, directive: &Directive) -> Result<GateDecision> {
        if run.status.is_closed() {
            return Err(SkillrunError::RunClosed {
                run: run.id.clone(),
                status: run.status.to_string(),
            });
        }
        if !run.status.accepts_directive() {
            return Err(SkillrunError::NoCheckpointPending(run.id.clone()));
        }

        let decision = CheckpointGate::new(self.registry).evaluate(directive)?;

        run.checkpoints.push(CheckpointRecord {
            after_position: run.last_done_position(),
            directive: directive.clone(),
            at: Utc::now(),
        });

        match &decision {
            GateDecision::Proceed => run.status = RunStatus::Ready,
            GateDecision::ProceedAutoAccept => {
                run.auto_accept = true;
                run.status = RunStatus::Ready;
            }
            GateDecision::ReplaceRemaining { skills } => {
                replace_remaining(run, skills);
                run.status = RunStatus::Ready;
            }
            GateDecision::Abort => run.status = RunStatus::Aborted,
        }

        run.sync_current();
        if run.status == RunStatus::Ready && !run.has_pending() {
            run.status = RunStatus::Completed;
        }
        run.touch();
        info!("run {}: {directive} -> {}", run.id, run.status);
        Ok(decision)
    }

    /// End the run now, from any open state.
    pub fn abort(&self, run: &mut WorkflowRun) -> Result<()> {
        if run.status.is_closed() {
            return Err(SkillrunError::RunClosed {
                run: run.id.clone(),
                status: run.status.to_string(),
            });
        }
        if run.status.accepts_directive() {
            self.checkpoint(run, &Directive::Abort)?;
        } else {
            run.status = RunStatus::Aborted;
            run.touch();
            info!("run {} aborted", run.id);
        }
        Ok(())
    }
}

/// Rewrite the not-yet-done steps to `subset`. Pending steps outside the
/// subset become skipped; subset names that are not pending are appended in
/// the given order; done steps are never touched.
fn replace_remaining(run: &mut WorkflowRun, subset: &[String]) {
    let mut seen = HashSet::new();
    let subset: Vec<&String> = subset.iter().filter(|s| seen.insert(*s)).collect();

    let done: HashSet<String> = run
        .steps_with(StepStatus::Done)
        .map(|s| s.skill.clone())
        .collect();

    let mut pending = HashSet::new();
    for step in run.steps.iter_mut() {
        if step.status != StepStatus::Pending {
            continue;
        }
        if subset.contains(&&step.skill) {
            pending.insert(step.skill.clone());
        } else {
            step.status = StepStatus::Skipped;
        }
    }

    for name in subset {
        if done.contains(name) {
            debug!("run {}: '{name}' already done, not re-running", run.id);
            continue;
        }
        if pending.insert(name.clone()) {
            let position = run.next_position();
            run.steps.push(WorkflowStep::new(position, name.clone()));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
