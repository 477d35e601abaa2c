use crate::error::{Result, SkillrunError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

/// What the user says at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    Confirm,
    Adjust { skills: Vec<String> },
    AutoAccept,
    Abort,
}

const CONFIRM_WORDS: &[&str] = &["confirm", "continue", "proceed", "next", "yes", "y", "ok"];
const AUTO_ACCEPT_WORDS: &[&str] = &[
    "auto-accept",
    "auto accept",
    "autoaccept",
    "auto",
    "just go",
    "go",
    "yolo",
];
const ABORT_WORDS: &[&str] = &["abort", "stop", "cancel", "quit"];

impl Directive {
    /// Classify free text into one of the directive intents.
    ///
    /// Adjust takes skill names separated by commas or whitespace:
    /// `adjust: security-auth, security-csrf`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let lowered = trimmed.to_lowercase();
        let intent = lowered.trim_end_matches(['.', '!']).trim();

        if CONFIRM_WORDS.contains(&intent) {
            return Ok(Directive::Confirm);
        }
        if AUTO_ACCEPT_WORDS.contains(&intent) {
            return Ok(Directive::AutoAccept);
        }
        if ABORT_WORDS.contains(&intent) {
            return Ok(Directive::Abort);
        }

        let adjust = intent
            .strip_prefix("adjust")
            .filter(|rest| rest.is_empty() || rest.starts_with([':', ' ', '\t']));
        if let Some(rest) = adjust {
            let rest = rest.trim_start().trim_start_matches(':');
            let skills: Vec<String> = rest
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if skills.is_empty() {
                return Err(SkillrunError::InvalidDirective(trimmed.to_string()));
            }
            return Ok(Directive::Adjust { skills });
        }

        Err(SkillrunError::InvalidDirective(trimmed.to_string()))
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Confirm => f.write_str("confirm"),
            Directive::Adjust { skills } => write!(f, "adjust: {}", skills.join(", ")),
            Directive::AutoAccept => f.write_str("auto-accept"),
            Directive::Abort => f.write_str("abort"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
