use crate::dispatch::DispatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillrunError {
    #[error("not initialized: run 'skillrun init'")]
    NotInitialized,

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("unknown skill(s): {}", .0.join(", "))]
    UnknownSkill(Vec<String>),

    #[error("step {position} ({skill}) failed")]
    Dispatch {
        skill: String,
        position: usize,
        #[source]
        source: DispatchError,
    },

    #[error("invalid skill document {path}: {reason}")]
    InvalidSkill { path: String, reason: String },

    #[error("invalid skill name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("skill '{skill}' requires unknown skill '{dependency}'")]
    DanglingDependency { skill: String, dependency: String },

    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("unrecognized directive '{0}': expected confirm, adjust: <skills>, auto-accept, or abort")]
    InvalidDirective(String),

    #[error("run {0} is waiting at a checkpoint: confirm, adjust, auto-accept, or abort first")]
    CheckpointPending(String),

    #[error("run {0} has no pending checkpoint")]
    NoCheckpointPending(String),

    #[error("run {run} is halted at step {position} ({skill}): confirm to retry, adjust, or abort")]
    RunHalted {
        run: String,
        position: usize,
        skill: String,
    },

    #[error("run {run} is already {status}")]
    RunClosed { run: String, status: String },

    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SkillrunError>;
