use crate::cmd::skill::load_registry;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use skillrun_core::{
    config::Config,
    directive::Directive,
    dispatch::RequestDispatcher,
    orchestrator::{Orchestrator, StepResult},
    run::WorkflowRun,
    summary::RunSummary,
    types::{RunStatus, StepStatus},
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum RunSubcommand {
    /// Plan a new run of an orchestrator skill
    Start {
        target: String,
        /// What the user asked for; naming one sub-skill runs only that step
        input: Vec<String>,
    },
    /// Execute the next pending step
    Next {
        id: String,
        /// Keep going while the run does not need direction
        #[arg(long)]
        all: bool,
    },
    /// Continue with the current plan
    Confirm { id: String },
    /// Replace the remaining steps with these skills
    Adjust {
        id: String,
        #[arg(required = true)]
        skills: Vec<String>,
    },
    /// Continue and stop pausing at checkpoints
    AutoAccept { id: String },
    /// End the run, keeping completed steps
    Abort { id: String },
    /// Give a free-text directive ("yes", "adjust: a, b", "just go", ...)
    Say {
        id: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show a run and its steps
    Show { id: String },
    /// List runs, newest first
    List {
        /// Only runs in this status (ready, awaiting_checkpoint, halted, completed, aborted)
        #[arg(long)]
        status: Option<RunStatus>,
    },
    /// Summarize a run
    Summary { id: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: RunSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RunSubcommand::Start { target, input } => start(root, &target, &input, json),
        RunSubcommand::Next { id, all } => next(root, &id, all, json),
        RunSubcommand::Confirm { id } => direct(root, &id, Directive::Confirm, json),
        RunSubcommand::Adjust { id, skills } => {
            direct(root, &id, Directive::Adjust { skills }, json)
        }
        RunSubcommand::AutoAccept { id } => direct(root, &id, Directive::AutoAccept, json),
        RunSubcommand::Abort { id } => direct(root, &id, Directive::Abort, json),
        RunSubcommand::Say { id, text } => {
            let directive = Directive::parse(&text.join(" "))?;
            direct(root, &id, directive, json)
        }
        RunSubcommand::Show { id } => show(root, &id, json),
        RunSubcommand::List { status } => list(root, status, json),
        RunSubcommand::Summary { id } => summary(root, &id, json),
    }
}

fn load_run(root: &Path, id: &str) -> anyhow::Result<WorkflowRun> {
    WorkflowRun::load(root, id).with_context(|| format!("failed to load run '{id}'"))
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

fn start(root: &Path, target: &str, input: &[String], json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let registry = load_registry(root)?;
    let orch = Orchestrator::with_config(&registry, &config.runs);

    let input = input.join(" ");
    let input = Some(input.trim()).filter(|s| !s.is_empty());
    let run = orch.start(target, input)?;
    run.save(root).context("failed to save run")?;

    if json {
        return print_json(&run);
    }

    println!("Started run: {} ({}, {} steps)", run.id, run.mode, run.steps.len());
    for step in &run.steps {
        println!("  {:>2}. {}", step.position, step.skill);
    }
    if run.status == RunStatus::Ready {
        println!("Next: skillrun run next {}", run.id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// next
// ---------------------------------------------------------------------------

fn next(root: &Path, id: &str, all: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let registry = load_registry(root)?;
    let orch = Orchestrator::with_config(&registry, &config.runs);
    let mut dispatcher = RequestDispatcher::new(root, config.dispatch.require_tools);
    let mut run = load_run(root, id)?;

    let mut results: Vec<StepResult> = Vec::new();
    loop {
        let outcome = orch.advance(&mut run, &mut dispatcher);
        // Persist halts as well as successes.
        run.save(root).context("failed to save run")?;
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                if json && !results.is_empty() {
                    print_json(&next_json(&run, &results))?;
                }
                return Err(e.into());
            }
        };
        if !json {
            print_step(&result);
        }
        results.push(result);
        if !all || run.status != RunStatus::Ready {
            break;
        }
    }

    if json {
        return print_json(&next_json(&run, &results));
    }

    print_next_hint(&run);
    Ok(())
}

fn next_json(run: &WorkflowRun, results: &[StepResult]) -> serde_json::Value {
    serde_json::json!({
        "run": run.id,
        "status": run.status,
        "steps": results,
    })
}

fn print_step(result: &StepResult) {
    println!("Step {} ({}) done: {}", result.position, result.skill, result.detail);
}

fn print_next_hint(run: &WorkflowRun) {
    match run.status {
        RunStatus::Ready => println!("Next: skillrun run next {}", run.id),
        RunStatus::AwaitingCheckpoint => {
            if let Some(step) = run.current_step() {
                println!("\nCheckpoint: next up is step {} ({}).", step.position, step.skill);
            }
            println!("  skillrun run confirm {}", run.id);
            println!("  skillrun run adjust {} <skill>...", run.id);
            println!("  skillrun run auto-accept {}", run.id);
        }
        RunStatus::Halted => {
            if let Some(step) = run.current_step() {
                println!(
                    "Halted at step {} ({}): {}",
                    step.position,
                    step.skill,
                    step.error.as_deref().unwrap_or("unknown error")
                );
            }
            println!("Retry with: skillrun run confirm {}", run.id);
        }
        RunStatus::Completed => println!("Run {} completed.", run.id),
        RunStatus::Aborted => println!("Run {} aborted.", run.id),
    }
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

fn direct(root: &Path, id: &str, directive: Directive, json: bool) -> anyhow::Result<()> {
    let registry = load_registry(root)?;
    let orch = Orchestrator::new(&registry);
    let mut run = load_run(root, id)?;

    if directive == Directive::Abort {
        orch.abort(&mut run)?;
    } else {
        orch.checkpoint(&mut run, &directive)?;
    }
    run.save(root).context("failed to save run")?;

    if json {
        return print_json(&serde_json::json!({
            "run": run.id,
            "directive": directive,
            "status": run.status,
            "auto_accept": run.auto_accept,
            "pending": pending_names(&run),
        }));
    }

    println!("{directive}: run {} is now {}", run.id, run.status);
    if let Directive::Adjust { .. } = directive {
        println!("Remaining: {}", pending_names(&run).join(", "));
    }
    print_next_hint(&run);
    Ok(())
}

fn pending_names(run: &WorkflowRun) -> Vec<String> {
    run.steps_with(StepStatus::Pending)
        .map(|s| s.skill.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// show / list / summary
// ---------------------------------------------------------------------------

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let run = load_run(root, id)?;
    if json {
        return print_json(&run);
    }

    println!("Run:     {}", run.id);
    println!("Target:  {} ({})", run.target, run.mode);
    if let Some(ref input) = run.user_input {
        println!("Input:   {input}");
    }
    println!("Status:  {}", run.status);
    if run.auto_accept {
        println!("Auto-accept: on");
    }
    println!("Created: {}", run.created_at.format("%Y-%m-%d %H:%M"));

    println!("\nSteps:");
    for step in &run.steps {
        let marker = if run.current_step().map(|c| c.position) == Some(step.position) {
            ">"
        } else {
            " "
        };
        println!(
            "{marker} {:>2}. {:<30} {}",
            step.position, step.skill, step.status
        );
        if let Some(ref err) = step.error {
            println!("        error: {err}");
        }
    }

    if !run.checkpoints.is_empty() {
        println!("\nCheckpoints ({}):", run.checkpoints.len());
        for cp in &run.checkpoints {
            let after = cp
                .after_position
                .map(|p| format!("after step {p}"))
                .unwrap_or_else(|| "before first step".to_string());
            println!("  {after}: {}", cp.directive);
        }
    }
    Ok(())
}

fn list(root: &Path, status: Option<RunStatus>, json: bool) -> anyhow::Result<()> {
    let mut runs = WorkflowRun::list(root).context("failed to list runs")?;
    if let Some(status) = status {
        runs.retain(|r| r.status == status);
    }

    if json {
        let rows: Vec<_> = runs
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "target": r.target,
                    "mode": r.mode,
                    "status": r.status,
                    "done": r.steps_with(StepStatus::Done).count(),
                    "steps": r.steps.len(),
                })
            })
            .collect();
        return print_json(&rows);
    }

    if runs.is_empty() {
        println!("No runs yet.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = runs
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.target.clone(),
                r.mode.to_string(),
                r.status.to_string(),
                format!("{}/{}", r.steps_with(StepStatus::Done).count(), r.steps.len()),
            ]
        })
        .collect();
    print_table(&["ID", "TARGET", "MODE", "STATUS", "DONE"], &rows);
    Ok(())
}

fn summary(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let run = load_run(root, id)?;
    let registry = load_registry(root)?;
    let summary = RunSummary::new(&run, &registry);
    if json {
        return print_json(&summary);
    }
    print!("{}", summary.render());
    Ok(())
}
