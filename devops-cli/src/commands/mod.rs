pub mod plan;
pub mod run;
pub mod startup;
pub mod sync;

use std::path::Path;

use clap::Args;
use color_eyre::Result;

use devops_service::planner::ALL_ALIAS;
use devops_service::{Config, ConfigLoader, PlanOptions, ProcessRunner, Selection};

/// What to run: `+`-joined names, `all` selects everything
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Action to run (e.g. start, down)
    pub action: String,

    /// Group(s) of the action
    pub group: String,

    /// Project(s) to include
    #[arg(default_value = ALL_ALIAS)]
    pub projects: String,

    /// Resolve cross-project needs (overrides the config file)
    #[arg(long, conflicts_with = "no_needs")]
    pub needs: bool,

    /// Ignore cross-project needs (overrides the config file)
    #[arg(long)]
    pub no_needs: bool,
}

impl SelectionArgs {
    pub fn selection(&self) -> Selection {
        Selection::parse(&self.action, &self.group, &self.projects)
    }

    pub fn plan_options(&self, config: &Config) -> PlanOptions {
        let mut options = PlanOptions::from_config(config);
        if self.needs {
            options.resolve_needs = true;
        }
        if self.no_needs {
            options.resolve_needs = false;
        }
        options
    }
}

/// Load the configuration for `cwd`, fetching it remotely when configured
pub async fn load_config(cwd: &Path) -> Result<Config> {
    let runner = ProcessRunner::default();
    let config = ConfigLoader::new(&runner).load(cwd).await?;
    Ok(config)
}
