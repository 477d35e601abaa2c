use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use skillrun_core::{config::Config, registry::SkillRegistry};
use std::path::Path;

#[derive(Subcommand)]
pub enum SkillSubcommand {
    /// List all registered skills
    List {
        /// Only skills that sequence other skills
        #[arg(long)]
        orchestrators: bool,
    },
    /// Show a skill's header and guidance
    Show { name: String },
    /// List a skill's required sub-skills in execution order
    Deps { name: String },
    /// Load and validate the registry
    Check,
}

pub fn run(root: &Path, subcmd: SkillSubcommand, json: bool) -> anyhow::Result<()> {
    let registry = load_registry(root)?;
    match subcmd {
        SkillSubcommand::List { orchestrators } => list(&registry, orchestrators, json),
        SkillSubcommand::Show { name } => show(&registry, &name, json),
        SkillSubcommand::Deps { name } => deps(&registry, &name, json),
        SkillSubcommand::Check => check(&registry, json),
    }
}

pub(crate) fn load_registry(root: &Path) -> anyhow::Result<SkillRegistry> {
    let config = Config::load(root).context("failed to load config")?;
    SkillRegistry::load(root, &config).context("failed to load skill registry")
}

fn list(registry: &SkillRegistry, orchestrators: bool, json: bool) -> anyhow::Result<()> {
    let skills = if orchestrators {
        registry.orchestrators()
    } else {
        registry.all()
    };

    if json {
        let rows: Vec<_> = skills
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.name,
                    "purpose": s.purpose,
                    "requires": s.requires,
                    "source": s.source.to_string(),
                })
            })
            .collect();
        return print_json(&rows);
    }

    if skills.is_empty() {
        println!("No skills registered.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = skills
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                if s.requires.is_empty() {
                    "-".to_string()
                } else {
                    s.requires.len().to_string()
                },
                s.source.to_string(),
                s.purpose.clone(),
            ]
        })
        .collect();
    print_table(&["NAME", "STEPS", "SOURCE", "PURPOSE"], &rows);
    Ok(())
}

fn show(registry: &SkillRegistry, name: &str, json: bool) -> anyhow::Result<()> {
    let skill = registry.resolve(name)?;
    if json {
        return print_json(skill);
    }

    println!("Skill:   {}", skill.name);
    println!("Purpose: {}", skill.purpose);
    println!("Source:  {}", skill.source);
    if let Some(ref tool) = skill.tool {
        println!("Tool:    {tool}");
    }
    if !skill.requires.is_empty() {
        println!("\nRequires ({}):", skill.requires.len());
        for (i, dep) in skill.requires.iter().enumerate() {
            println!("  {:>2}. {dep}", i + 1);
        }
    }
    if !skill.recommends.is_empty() {
        println!("\nRecommends: {}", skill.recommends.join(", "));
    }
    if !skill.triggers.is_empty() {
        println!("Triggers:   {}", skill.triggers.join(", "));
    }
    if !skill.summary_fields.is_empty() {
        println!("Report:     {}", skill.summary_fields.join(", "));
    }
    println!("\n{}", skill.guidance.trim_end());
    Ok(())
}

fn deps(registry: &SkillRegistry, name: &str, json: bool) -> anyhow::Result<()> {
    let deps = registry.dependencies_of(name)?;
    if json {
        let names: Vec<&str> = deps.iter().map(|s| s.name.as_str()).collect();
        return print_json(&names);
    }
    if deps.is_empty() {
        println!("'{name}' has no required sub-skills; it runs as a single step.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = deps
        .iter()
        .enumerate()
        .map(|(i, s)| vec![(i + 1).to_string(), s.name.clone(), s.purpose.clone()])
        .collect();
    print_table(&["#", "SKILL", "PURPOSE"], &rows);
    Ok(())
}

fn check(registry: &SkillRegistry, json: bool) -> anyhow::Result<()> {
    let orchestrators = registry.orchestrators().len();
    if json {
        return print_json(&serde_json::json!({
            "ok": true,
            "skills": registry.len(),
            "orchestrators": orchestrators,
        }));
    }
    println!(
        "Registry OK: {} skills, {orchestrators} orchestrators.",
        registry.len()
    );
    Ok(())
}
