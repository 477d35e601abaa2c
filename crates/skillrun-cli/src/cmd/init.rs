use anyhow::Context;
use skillrun_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing skillrun in: {}", root.display());

    for p in [
        paths::skillrun_dir(root),
        paths::skills_dir(root),
        paths::runs_dir(root),
    ] {
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    println!("\nskillrun initialized.");
    println!("Project skills go in {}/<name>/SKILL.md", paths::SKILLS_DIR);
    println!("Next: skillrun skill list");
    Ok(())
}
