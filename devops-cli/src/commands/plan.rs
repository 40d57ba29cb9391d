use std::path::Path;

use clap::Args;
use color_eyre::Result;

use devops_service::execution::waves;
use devops_service::TaskPlanner;

use super::{load_config, SelectionArgs};
use crate::output;

/// Show the tasks a run would execute
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(cwd: &Path, args: PlanArgs) -> Result<()> {
    let config = load_config(cwd).await?;
    let plan = TaskPlanner::new(&config)
        .with_options(args.selection.plan_options(&config))
        .plan(&args.selection.selection())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan.tasks)?);
        return Ok(());
    }

    for skipped in &plan.skipped {
        output::warning(&format!("{} skipped: {}", skipped.key, skipped.reason));
    }

    if plan.tasks.is_empty() {
        output::no_groups(&args.selection.action, &args.selection.group);
        return Ok(());
    }

    for (priority, tasks) in waves(plan.tasks) {
        output::wave_header(priority, tasks.len());
        for task in &tasks {
            println!("    {} \x1b[2m({})\x1b[0m", task.key, task.dir.display());
            println!("        {}", task.cmd.join(" "));
            if !task.needs.is_empty() {
                let needs: Vec<String> = task.needs.iter().map(|n| n.to_string()).collect();
                output::dim(&format!("        needs {}", needs.join(", ")));
            }
        }
    }

    Ok(())
}
