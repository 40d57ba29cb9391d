use std::path::Path;
use std::sync::Arc;

use clap::Args;
use color_eyre::Result;

use devops_service::planner::ALL_ALIAS;
use devops_service::{Config, GitSync, ProcessRunner, Selector};

use super::load_config;
use crate::output;

/// Clone or update project checkouts
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Project(s) to sync, `+`-joined
    #[arg(default_value = ALL_ALIAS)]
    pub projects: String,
}

pub async fn execute(cwd: &Path, args: SyncArgs) -> Result<()> {
    let config = load_config(cwd).await?;
    if !sync_projects(&config, &Selector::parse(&args.projects)).await {
        std::process::exit(1);
    }
    Ok(())
}

/// Sync the selected projects and print a line each. Returns false when any
/// checkout needs attention.
pub async fn sync_projects(config: &Config, projects: &Selector) -> bool {
    output::status("Syncing", &config.cwd.display().to_string());

    let mut clean = true;
    for result in GitSync::new(Arc::new(ProcessRunner::default()))
        .sync_all(config, projects)
        .await
    {
        match result {
            Ok(report) => {
                clean &= !report.outcome.is_problem();
                output::sync_report(&report);
            }
            Err(e) => {
                clean = false;
                output::error(&e.to_string());
            }
        }
    }
    clean
}
