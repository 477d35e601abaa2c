//! Skill documents: Markdown guidance with a YAML frontmatter header.
//!
//! ```text
//! ---
//! name: security-audit
//! description: Full security audit of a web application
//! requires: [security-static-analysis, security-code-review]
//! tool: semgrep
//! ---
//! # Security Audit
//! ...
//! ```

use crate::error::{Result, SkillrunError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// SkillSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkillSource {
    Builtin,
    File { path: PathBuf },
}

impl std::fmt::Display for SkillSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillSource::Builtin => f.write_str("builtin"),
            SkillSource::File { path } => write!(f, "{}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// SkillHeader (frontmatter)
// ---------------------------------------------------------------------------

/// The frontmatter block of a skill document. Also the entry shape of the
/// built-in catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillHeader {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommends: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,
}

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A named unit of guidance. Immutable once loaded into a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub purpose: String,
    /// Required sub-skills in document order. Resolved by the registry.
    pub requires: Vec<String>,
    pub recommends: Vec<String>,
    /// External tool the skill's guidance drives (e.g. `semgrep`).
    pub tool: Option<String>,
    pub triggers: Vec<String>,
    /// Field names of this skill family's final report.
    pub summary_fields: Vec<String>,
    pub guidance: String,
    pub source: SkillSource,
}

impl Skill {
    pub fn from_header(header: SkillHeader, guidance: String, source: SkillSource) -> Self {
        Self {
            name: header.name,
            purpose: header.description,
            requires: header.requires,
            recommends: header.recommends,
            tool: header.tool,
            triggers: header.triggers,
            summary_fields: header.summary,
            guidance,
            source,
        }
    }

    /// Orchestrators are skills that sequence other skills.
    pub fn is_orchestrator(&self) -> bool {
        !self.requires.is_empty()
    }

    /// Parse a skill document. `source` is used for error reporting and
    /// recorded on the returned skill.
    pub fn parse(content: &str, source: SkillSource) -> Result<Self> {
        let invalid = |reason: String| SkillrunError::InvalidSkill {
            path: source.to_string(),
            reason,
        };

        let (frontmatter, body) = split_frontmatter(content)
            .ok_or_else(|| invalid("missing '---' frontmatter block".to_string()))?;
        let header: SkillHeader =
            serde_yaml::from_str(frontmatter).map_err(|e| invalid(e.to_string()))?;

        paths::validate_slug(&header.name)?;
        if header.description.trim().is_empty() {
            return Err(invalid("description must not be empty".to_string()));
        }
        for dep in header.requires.iter().chain(&header.recommends) {
            paths::validate_slug(dep)?;
        }

        Ok(Self::from_header(header, body.trim().to_string(), source))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(
            &content,
            SkillSource::File {
                path: path.to_path_buf(),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Frontmatter splitting
// ---------------------------------------------------------------------------

/// Split a document into the YAML between the first pair of `---` lines and
/// the remaining body.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix("---")?;
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;
    // An empty frontmatter block closes immediately.
    if let Some(body) = rest.strip_prefix("---") {
        return Some(("", body));
    }
    let end = rest.find("\n---")?;
    let body = &rest[end + 4..];
    let body = body.split_once('\n').map(|(_, b)| b).unwrap_or("");
    Some((&rest[..end], body))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const AUDIT: &str = "---\nname: security-audit\ndescription: Audit a web app\nrequires:\n  - security-static-analysis\n  - security-code-review\nsummary: [security_score, findings_by_severity]\n---\n# Security Audit\n\nRun each phase.\n";

    #[test]
    fn parses_frontmatter_and_body() {
        let skill = Skill::parse(AUDIT, SkillSource::Builtin).unwrap();
        assert_eq!(skill.name, "security-audit");
        assert_eq!(skill.purpose, "Audit a web app");
        assert_eq!(
            skill.requires,
            vec!["security-static-analysis", "security-code-review"]
        );
        assert_eq!(skill.summary_fields.len(), 2);
        assert!(skill.guidance.starts_with("# Security Audit"));
        assert!(skill.is_orchestrator());
    }

    #[test]
    fn leaf_skill_defaults() {
        let doc = "---\nname: security-csrf\ndescription: CSRF protection\ntool: semgrep\n---\nbody\n";
        let skill = Skill::parse(doc, SkillSource::Builtin).unwrap();
        assert!(skill.requires.is_empty());
        assert!(!skill.is_orchestrator());
        assert_eq!(skill.tool.as_deref(), Some("semgrep"));
        assert_eq!(skill.guidance, "body");
    }

    #[test]
    fn missing_frontmatter_is_invalid() {
        let err = Skill::parse("# Just markdown\n", SkillSource::Builtin).unwrap_err();
        assert!(matches!(err, SkillrunError::InvalidSkill { .. }));
    }

    #[test]
    fn unknown_frontmatter_field_rejected() {
        let doc = "---\nname: a\ndescription: b\nrequire: [c]\n---\n";
        let err = Skill::parse(doc, SkillSource::Builtin).unwrap_err();
        assert!(matches!(err, SkillrunError::InvalidSkill { .. }));
    }

    #[test]
    fn invalid_name_rejected() {
        let doc = "---\nname: Security Audit\ndescription: b\n---\n";
        assert!(matches!(
            Skill::parse(doc, SkillSource::Builtin),
            Err(SkillrunError::InvalidSlug(_))
        ));
    }

    #[test]
    fn error_reports_source_path() {
        let source = SkillSource::File {
            path: PathBuf::from("skills/broken/SKILL.md"),
        };
        let err = Skill::parse("---\nname: a\n", source).unwrap_err();
        assert!(err.to_string().contains("skills/broken/SKILL.md"));
    }

    #[test]
    fn crlf_frontmatter() {
        let doc = "---\r\nname: a\r\ndescription: b\r\n---\r\nbody\r\n";
        let skill = Skill::parse(doc, SkillSource::Builtin).unwrap();
        assert_eq!(skill.name, "a");
        assert_eq!(skill.guidance, "body");
    }
}
