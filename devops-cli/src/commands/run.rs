use crate::output;

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use color_eyre::Result;

use devops_service::execution::LogLevel;
use devops_service::{
    progress_channel, search_output_for_hints, ExecutionEvent, ProcessRunner, SchedulerConfig,
    TaskPlanner, WaveScheduler,
};

use super::{load_config, startup::startup_checks, sync::sync_projects, SelectionArgs};

/// Sync projects, then run an action's groups wave by wave
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Maximum tasks running at once (0 = unlimited)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub max_parallel: usize,

    /// Don't run startup checks
    #[arg(long)]
    pub skip_startup: bool,

    /// Don't clone or update checkouts before running
    #[arg(long)]
    pub skip_sync: bool,
}

pub async fn execute(cwd: &Path, args: RunArgs) -> Result<()> {
    let config = load_config(cwd).await?;

    if !args.skip_startup {
        startup_checks(&config).await?;
    }

    let selection = args.selection.selection();
    if !args.skip_sync {
        // Problems are reported per checkout; running continues regardless
        sync_projects(&config, &selection.projects).await;
    }

    let plan = TaskPlanner::new(&config)
        .with_options(args.selection.plan_options(&config))
        .plan(&selection)?;

    for skipped in &plan.skipped {
        output::warning(&format!("{} skipped: {}", skipped.key, skipped.reason));
    }

    if plan.tasks.is_empty() {
        output::no_groups(&args.selection.action, &args.selection.group);
        return Ok(());
    }

    let (tx, mut rx) = progress_channel();
    let scheduler = WaveScheduler::new(Arc::new(ProcessRunner::default()))
        .with_config(SchedulerConfig {
            max_parallel: args.max_parallel,
        })
        .with_progress(tx);

    // Spawn execution in background
    let tasks = plan.tasks;
    let exec_handle = tokio::spawn(async move { scheduler.run(tasks).await });

    // Process events in the foreground
    while let Some(event) = rx.recv().await {
        match &event {
            ExecutionEvent::RunStarted {
                total_tasks,
                total_waves,
            } => {
                println!();
                output::header(&format!(
                    "Running {} tasks in {} waves",
                    total_tasks, total_waves
                ));
            }

            ExecutionEvent::RunCompleted {
                success,
                failed_tasks,
                duration,
            } => {
                println!();
                if *success {
                    output::success(&format!(
                        "All tasks completed in {:.2}s",
                        duration.as_secs_f64()
                    ));
                } else {
                    output::failure(&format!(
                        "{} task(s) failed after {:.2}s",
                        failed_tasks,
                        duration.as_secs_f64()
                    ));
                }
            }

            ExecutionEvent::WaveStarted {
                priority,
                total_tasks,
            } => {
                output::wave_header(*priority, *total_tasks);
            }

            ExecutionEvent::WaveCompleted {
                priority,
                failed_tasks,
                duration,
            } => {
                let line = format!(
                    "  Wave {} {} ({:.2}s)",
                    priority,
                    if *failed_tasks == 0 { "OK" } else { "FAIL" },
                    duration.as_secs_f64()
                );
                if *failed_tasks == 0 {
                    output::dim_success(&line);
                } else {
                    output::dim_failure(&line);
                }
            }

            ExecutionEvent::TaskBlocked { key, waiting_on } => {
                let names: Vec<String> = waiting_on.iter().map(|k| k.to_string()).collect();
                output::dim(&format!("    {} waiting on {}", key, names.join(", ")));
            }

            ExecutionEvent::TaskStarted { cmd, dir, .. } => {
                output::task_started(cmd, dir);
            }

            ExecutionEvent::TaskCompleted { output: entry } => {
                let line = format!(
                    "    {} {} ({:.2}s)",
                    entry.key,
                    if entry.success() { "OK" } else { "FAIL" },
                    entry.duration.as_secs_f64()
                );
                if entry.success() {
                    output::dim_success(&line);
                } else {
                    output::dim_failure(&line);
                }
            }

            ExecutionEvent::Log { level, message } => match level {
                LogLevel::Warning => output::warning(message),
                LogLevel::Info => output::info(message),
            },
        }
    }

    // Wait for scheduler to finish
    let result = exec_handle.await?;

    println!();
    for entry in &result.outputs {
        output::action_output(entry);
    }
    for found in search_output_for_hints(&config.search_for, &result.outputs) {
        output::hint(&found);
    }

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
