//! Invocation boundary: hands a step to whatever follows the skill's guidance.
//!
//! A dispatcher never touches the `WorkflowRun`; it reports completion or
//! failure and the orchestrator records the outcome.

use crate::paths;
use crate::skill::Skill;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Read-only view of the run handed to a dispatcher.
#[derive(Debug, Clone)]
pub struct InvocationContext<'a> {
    pub run_id: &'a str,
    pub target: &'a str,
    /// 1-based position of the step being invoked.
    pub position: usize,
    /// Number of steps in the run, including settled ones.
    pub total: usize,
    pub user_input: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSignal {
    /// Free-form outcome detail recorded on the step (e.g. request path).
    pub detail: String,
}

impl CompletionSignal {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("skill unavailable: {0}")]
    Unavailable(String),

    #[error("skill failed: {0}")]
    Failed(String),
}

pub trait Dispatcher {
    fn invoke(
        &mut self,
        skill: &Skill,
        ctx: &InvocationContext<'_>,
    ) -> Result<CompletionSignal, DispatchError>;
}

// ---------------------------------------------------------------------------
// RequestDispatcher
// ---------------------------------------------------------------------------

/// Writes a dispatch request document per step under
/// `.skillrun/runs/<id>/NN-<skill>.md` for the assistant to act on.
pub struct RequestDispatcher {
    root: PathBuf,
    require_tools: bool,
}

impl RequestDispatcher {
    pub fn new(root: impl Into<PathBuf>, require_tools: bool) -> Self {
        Self {
            root: root.into(),
            require_tools,
        }
    }

    fn check_tool(&self, skill: &Skill) -> Result<(), DispatchError> {
        let Some(ref tool) = skill.tool else {
            return Ok(());
        };
        if !self.require_tools {
            return Ok(());
        }
        which::which(tool).map(|_| ()).map_err(|_| {
            DispatchError::Unavailable(format!(
                "'{}' requires '{tool}', which is not on PATH",
                skill.name
            ))
        })
    }
}

impl Dispatcher for RequestDispatcher {
    fn invoke(
        &mut self,
        skill: &Skill,
        ctx: &InvocationContext<'_>,
    ) -> Result<CompletionSignal, DispatchError> {
        self.check_tool(skill)?;

        let path = paths::request_path(&self.root, ctx.run_id, ctx.position, &skill.name);
        let doc = build_request(skill, ctx);
        crate::io::atomic_write(&path, doc.as_bytes())
            .map_err(|e| DispatchError::Failed(format!("writing {}: {e}", path.display())))?;
        debug!("wrote dispatch request {}", path.display());

        Ok(CompletionSignal::new(relative_display(&self.root, &path)))
    }
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ---------------------------------------------------------------------------
// build_request
// ---------------------------------------------------------------------------

/// Render the Markdown request that asks the assistant to act under `skill`.
pub fn build_request(skill: &Skill, ctx: &InvocationContext<'_>) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# Skill: {}\n\n", skill.name));
    doc.push_str(&format!("**Purpose:** {}\n", skill.purpose));
    doc.push_str(&format!(
        "**Step:** {} of {} in `{}`\n",
        ctx.position, ctx.total, ctx.target
    ));
    doc.push_str(&format!("**Run:** {}\n", ctx.run_id));
    if let Some(ref tool) = skill.tool {
        doc.push_str(&format!("**Tool:** `{tool}`\n"));
    }

    if let Some(input) = ctx.user_input.filter(|s| !s.trim().is_empty()) {
        doc.push_str("\n## Request\n\n");
        doc.push_str(input.trim());
        doc.push('\n');
    }

    if !skill.recommends.is_empty() {
        doc.push_str("\n## Related Skills\n\n");
        for rec in &skill.recommends {
            doc.push_str(&format!("- `{rec}`\n"));
        }
    }

    doc.push_str("\n## Guidance\n\n");
    doc.push_str(&skill.guidance);
    if !doc.ends_with('\n') {
        doc.push('\n');
    }

    doc.push_str("\n## On Completion\n\n");
    doc.push_str("Report findings for this step, then pause for direction:\n");
    doc.push_str(&format!("1. `skillrun run confirm {}`\n", ctx.run_id));
    doc.push_str(&format!(
        "2. `skillrun run adjust {} <skill>...` to change the remaining plan\n",
        ctx.run_id
    ));
    doc.push_str(&format!(
        "3. `skillrun run auto-accept {}` to finish without further pauses\n",
        ctx.run_id
    ));

    doc
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
