//! Checkpoint gate: turns a user directive into a decision. Pure; the
//! orchestrator applies the decision to the run.

use crate::directive::Directive;
use crate::error::{Result, SkillrunError};
use crate::registry::SkillRegistry;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GateDecision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateDecision {
    /// Continue with the current sequence.
    Proceed,
    /// Continue with the not-yet-done steps replaced by this subset.
    ReplaceRemaining { skills: Vec<String> },
    /// Continue and never pause again for this run.
    ProceedAutoAccept,
    /// End the run here.
    Abort,
}

// ---------------------------------------------------------------------------
// CheckpointGate
// ---------------------------------------------------------------------------

pub struct CheckpointGate<'a> {
    registry: &'a SkillRegistry,
}

impl<'a> CheckpointGate<'a> {
    pub fn new(registry: &'a SkillRegistry) -> Self {
        Self { registry }
    }

    /// Adjust subsets are validated against the registry; any unregistered
    /// name fails the whole directive with `UnknownSkill`.
    pub fn evaluate(&self, directive: &Directive) -> Result<GateDecision> {
        match directive {
            Directive::Confirm => Ok(GateDecision::Proceed),
            Directive::AutoAccept => Ok(GateDecision::ProceedAutoAccept),
            Directive::Abort => Ok(GateDecision::Abort),
            Directive::Adjust { skills } => {
                let unknown: Vec<String> = skills
                    .iter()
                    .filter(|s| !self.registry.contains(s))
                    .cloned()
                    .collect();
                if !unknown.is_empty() {
                    return Err(SkillrunError::UnknownSkill(unknown));
                }
                Ok(GateDecision::ReplaceRemaining {
                    skills: skills.clone(),
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
