mod commands;
mod logging;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;

/// Keep local project checkouts in sync and run their actions
#[derive(Parser, Debug)]
#[command(name = "git-local-devops", version, about)]
struct Cli {
    /// Base directory holding .git-local-devops.yml (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync projects, then run an action's groups wave by wave
    Run(commands::run::RunArgs),

    /// Show the tasks a run would execute
    Plan(commands::plan::PlanArgs),

    /// Clone or update project checkouts
    Sync(commands::sync::SyncArgs),

    /// Run the configured startup checks
    Startup,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::init();

    let cli = Cli::parse();
    let cwd = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Command::Run(args) => commands::run::execute(&cwd, args).await,
        Command::Plan(args) => commands::plan::execute(&cwd, args).await,
        Command::Sync(args) => commands::sync::execute(&cwd, args).await,
        Command::Startup => commands::startup::execute(&cwd).await,
    }
}
