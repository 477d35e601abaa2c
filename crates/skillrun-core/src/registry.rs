//! Read-only skill registry, validated once at load time.

use crate::catalog;
use crate::config::Config;
use crate::error::{Result, SkillrunError};
use crate::paths;
use crate::skill::Skill;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    skills: BTreeMap<String, Skill>,
}

impl SkillRegistry {
    /// Build a registry from skills in source order. A later skill with the
    /// same name replaces the earlier one. Fails on dangling `requires`
    /// entries and dependency cycles.
    pub fn from_skills(skills: impl IntoIterator<Item = Skill>) -> Result<Self> {
        let mut map: BTreeMap<String, Skill> = BTreeMap::new();
        for skill in skills {
            if let Some(existing) = map.get(&skill.name) {
                warn!(
                    "skill '{}' from {} overrides definition from {}",
                    skill.name, skill.source, existing.source
                );
            }
            map.insert(skill.name.clone(), skill);
        }
        let registry = Self { skills: map };
        registry.validate()?;
        debug!("skill registry loaded with {} skills", registry.len());
        Ok(registry)
    }

    /// Built-in catalog (unless disabled) followed by every configured skills
    /// directory, in config order.
    pub fn load(root: &Path, config: &Config) -> Result<Self> {
        let mut skills = Vec::new();
        if config.skills.builtin {
            skills.extend(catalog::builtin_skills()?);
        }
        for dir in &config.skills.dirs {
            let dir = if dir.is_absolute() {
                dir.clone()
            } else {
                root.join(dir)
            };
            skills.extend(scan_dir(&dir)?);
        }
        Self::from_skills(skills)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn resolve(&self, name: &str) -> Result<&Skill> {
        self.skills
            .get(name)
            .ok_or_else(|| SkillrunError::SkillNotFound(name.to_string()))
    }

    /// Required sub-skills of `name` in document order; empty for leaves.
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&Skill>> {
        let skill = self.resolve(name)?;
        skill.requires.iter().map(|dep| self.resolve(dep)).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    /// All skills sorted by name.
    pub fn all(&self) -> Vec<&Skill> {
        self.skills.values().collect()
    }

    pub fn orchestrators(&self) -> Vec<&Skill> {
        self.skills.values().filter(|s| s.is_orchestrator()).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Find the single sub-skill of `target` that `input` names. Returns
    /// `None` when nothing matches or the input is ambiguous.
    pub fn match_concern(&self, target: &str, input: &str) -> Result<Option<&Skill>> {
        let words = normalize(input);
        if words.is_empty() {
            return Ok(None);
        }
        let target_segments: Vec<&str> = target.split('-').collect();

        let matches: Vec<&Skill> = self
            .dependencies_of(target)?
            .into_iter()
            .filter(|dep| {
                match_phrases(dep, &target_segments)
                    .iter()
                    .any(|phrase| contains_phrase(&words, phrase))
            })
            .collect();

        match matches.as_slice() {
            [one] => Ok(Some(*one)),
            [] => Ok(None),
            many => {
                let names: Vec<&str> = many.iter().map(|s| s.name.as_str()).collect();
                warn!(
                    "input '{input}' matches several sub-skills of {target} ({}); running full sequence",
                    names.join(", ")
                );
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    fn validate(&self) -> Result<()> {
        for skill in self.skills.values() {
            for dep in &skill.requires {
                if !self.skills.contains_key(dep) {
                    return Err(SkillrunError::DanglingDependency {
                        skill: skill.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
            for rec in &skill.recommends {
                if !self.skills.contains_key(rec) {
                    warn!("skill '{}' recommends unknown skill '{rec}'", skill.name);
                }
            }
        }
        self.check_cycles()
    }

    fn check_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            registry: &'a SkillRegistry,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|s| *s == name).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|s| s.to_string()).collect();
                    cycle.push(name.to_string());
                    return Err(SkillrunError::DependencyCycle(cycle));
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            stack.push(name);
            if let Some(skill) = registry.skills.get(name) {
                for dep in &skill.requires {
                    visit(registry, dep, marks, stack)?;
                }
            }
            stack.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        for name in self.skills.keys() {
            visit(self, name, &mut marks, &mut stack)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Directory scanning
// ---------------------------------------------------------------------------

/// Load every `<dir>/<name>/SKILL.md`, sorted by directory name. A missing
/// directory yields no skills.
pub fn scan_dir(dir: &Path) -> Result<Vec<Skill>> {
    if !dir.is_dir() {
        debug!("skills directory {} not present, skipping", dir.display());
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.join(paths::SKILL_FILE).is_file() {
            entries.push(path);
        }
    }
    entries.sort();

    let mut skills = Vec::with_capacity(entries.len());
    for entry in entries {
        let skill = Skill::load(&entry.join(paths::SKILL_FILE))?;
        debug!("loaded skill '{}' from {}", skill.name, skill.source);
        skills.push(skill);
    }
    Ok(skills)
}

// ---------------------------------------------------------------------------
// Concern matching
// ---------------------------------------------------------------------------

fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn match_phrases(skill: &Skill, target_segments: &[&str]) -> Vec<Vec<String>> {
    let mut phrases = vec![normalize(&skill.name)];
    if let Some((first, rest)) = skill.name.split_once('-') {
        if target_segments.contains(&first) {
            phrases.push(normalize(rest));
        }
    }
    phrases.extend(skill.triggers.iter().map(|t| normalize(t)));
    phrases.retain(|p| !p.is_empty());
    phrases
}

fn contains_phrase(words: &[String], phrase: &[String]) -> bool {
    words.windows(phrase.len()).any(|w| w == phrase)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
