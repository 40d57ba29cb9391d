use std::path::Path;

use color_eyre::Result;

use devops_service::{run_startup_checks, Config, ProcessRunner};

use super::load_config;
use crate::output;

pub async fn execute(cwd: &Path) -> Result<()> {
    let config = load_config(cwd).await?;
    startup_checks(&config).await
}

pub async fn startup_checks(config: &Config) -> Result<()> {
    if config.startup.is_empty() {
        return Ok(());
    }

    output::status("Checking", &format!("{} startup checks", config.startup.len()));
    run_startup_checks(&ProcessRunner::default(), config).await?;
    output::success("Startup checks passed");
    Ok(())
}
