use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scribe_player::AnimationSpeed;

#[derive(Parser)]
#[command(
    name = "scribe",
    about = "Scribe: apply edit plans as animated, verified file edits",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the edit sequence and line changes between two files
    Diff(DiffArgs),
    /// Apply an edit plan (JSON) to a workspace
    Apply(ApplyArgs),
    /// Create a new project from a project structure (JSON)
    Scaffold(ScaffoldArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Workspace root the plan's paths are relative to
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    /// Settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Replay edits character by character instead of writing them at once
    #[arg(long)]
    pub animate: bool,
    /// Typing speed when animating: slow, normal or fast
    #[arg(long)]
    pub speed: Option<AnimationSpeed>,
    /// Stop at the first failed operation
    #[arg(long)]
    pub stop_on_error: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub plan: PathBuf,
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args)]
pub struct ScaffoldArgs {
    pub structure: PathBuf,
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
