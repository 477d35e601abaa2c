use crate::error::{Result, SkillrunError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SKILLRUN_DIR: &str = ".skillrun";
pub const SKILLS_DIR: &str = ".skillrun/skills";
pub const RUNS_DIR: &str = ".skillrun/runs";

pub const CONFIG_FILE: &str = ".skillrun/config.yaml";

pub const SKILL_FILE: &str = "SKILL.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn skillrun_dir(root: &Path) -> PathBuf {
    root.join(SKILLRUN_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn skills_dir(root: &Path) -> PathBuf {
    root.join(SKILLS_DIR)
}

pub fn runs_dir(root: &Path) -> PathBuf {
    root.join(RUNS_DIR)
}

pub fn run_file(root: &Path, run_id: &str) -> PathBuf {
    runs_dir(root).join(format!("{run_id}.yaml"))
}

/// Directory holding the dispatch request documents of one run.
pub fn run_requests_dir(root: &Path, run_id: &str) -> PathBuf {
    runs_dir(root).join(run_id)
}

pub fn request_path(root: &Path, run_id: &str, position: usize, skill: &str) -> PathBuf {
    run_requests_dir(root, run_id).join(format!("{position:02}-{skill}.md"))
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(SkillrunError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
