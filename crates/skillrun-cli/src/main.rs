mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, run::RunSubcommand, skill::SkillSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skillrun",
    about = "Checkpointed skill orchestration: run a skill's sub-skills one step at a time",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .skillrun/ or .git/)
    #[arg(long, global = true, env = "SKILLRUN_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize skillrun in the current project
    Init,

    /// Inspect the skill registry
    Skill {
        #[command(subcommand)]
        subcommand: SkillSubcommand,
    },

    /// Start, advance, and direct workflow runs
    Run {
        #[command(subcommand)]
        subcommand: RunSubcommand,
    },

    /// Show or validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins when set; otherwise only warnings and errors.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Skill { subcommand } => cmd::skill::run(&root, subcommand, cli.json),
        Commands::Run { subcommand } => cmd::run::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
