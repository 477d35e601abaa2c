use crate::error::{Result, SkillrunError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SkillsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Directories scanned for `<name>/SKILL.md`, relative to the project root.
    #[serde(default = "default_skill_dirs")]
    pub dirs: Vec<PathBuf>,
    /// Load the built-in catalog before project skills.
    #[serde(default = "default_true")]
    pub builtin: bool,
}

fn default_skill_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from(paths::SKILLS_DIR)]
}

fn default_true() -> bool {
    true
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            dirs: default_skill_dirs(),
            builtin: true,
        }
    }
}

// ---------------------------------------------------------------------------
// RunsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunsConfig {
    /// Initial `auto_accept` flag for new runs.
    #[serde(default)]
    pub auto_accept: bool,
    /// Collapse a run to one sub-skill when the user input names it.
    #[serde(default = "default_true")]
    pub targeted_mode: bool,
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            auto_accept: false,
            targeted_mode: true,
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Fail dispatch when a skill's external tool is not on PATH.
    #[serde(default)]
    pub require_tools: bool,
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub runs: RunsConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            skills: SkillsConfig::default(),
            runs: RunsConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(SkillrunError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !self.skills.builtin && self.skills.dirs.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "skills.builtin is false and skills.dirs is empty: no skills can load"
                    .to_string(),
            });
        }

        for dir in &self.skills.dirs {
            let full = if dir.is_absolute() {
                dir.clone()
            } else {
                root.join(dir)
            };
            if !full.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("skills directory '{}' does not exist", dir.display()),
                });
            }
        }

        if self.runs.auto_accept {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "runs.auto_accept is on: new runs will never pause at checkpoints"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
