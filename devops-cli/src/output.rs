// Output formatting helpers for CLI commands

use std::path::Path;

use devops_service::{ActionOutput, HintMatch, SyncOutcome, SyncReport};

/// Print a status message: "  Status message"
pub fn status(action: &str, message: &str) {
    eprintln!("\x1b[1;36m{:>12}\x1b[0m {}", action, message);
}

/// Print a success message with checkmark
pub fn success(message: &str) {
    eprintln!("\x1b[1;32m  \u{2713}\x1b[0m {}", message);
}

/// Print a failure message with X
pub fn failure(message: &str) {
    eprintln!("\x1b[1;31m  \u{2717}\x1b[0m {}", message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("\x1b[33m  !\x1b[0m {}", message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("\x1b[1;31merror:\x1b[0m {}", message);
}

/// Print an info message
pub fn info(message: &str) {
    eprintln!("\x1b[36m  i\x1b[0m {}", message);
}

/// Print a dim/muted message
pub fn dim(message: &str) {
    eprintln!("\x1b[2m{}\x1b[0m", message);
}

/// Print a dim success message
pub fn dim_success(message: &str) {
    eprintln!("\x1b[32m{}\x1b[0m", message);
}

/// Print a dim failure message
pub fn dim_failure(message: &str) {
    eprintln!("\x1b[31m{}\x1b[0m", message);
}

/// Print a wave header
pub fn wave_header(priority: i64, total_tasks: usize) {
    eprintln!(
        "\x1b[1;34m  Wave\x1b[0m priority {} ({} tasks)",
        priority, total_tasks
    );
}

/// Print a header line
pub fn header(message: &str) {
    eprintln!("\x1b[1m==> {}\x1b[0m", message);
}

/// Live line for a task handed to the executor
pub fn task_started(cmd: &[String], dir: &Path) {
    println!("{}", started_line(cmd, dir));
}

fn started_line(cmd: &[String], dir: &Path) -> String {
    format!(
        "    \x1b[34m{}\x1b[0m is running in \x1b[36m{}\x1b[0m",
        cmd.join(" "),
        dir.display()
    )
}

/// Summary line for one settled task
pub fn action_output(entry: &ActionOutput) {
    let cmd = entry.cmd.join(" ");
    if entry.success() {
        println!(
            "\x1b[34m{}\x1b[0m ran in \x1b[36m{}\x1b[0m",
            cmd,
            entry.dir.display()
        );
    } else {
        eprintln!(
            "\"{}\" \"{}\" \x1b[31mfailed\x1b[0m, goto \x1b[36m{}\x1b[0m and run \x1b[34m{}\x1b[0m manually",
            entry.key.action,
            entry.key.group,
            entry.dir.display(),
            cmd
        );
    }
}

pub fn hint(found: &HintMatch) {
    println!(
        "\x1b[33mHint: {}\x1b[0m \x1b[2m(Source: {})\x1b[0m",
        found.hint, found.source
    );
}

pub fn no_groups(action: &str, group: &str) {
    warning(&format!(
        "No groups found for action {} and group {}",
        action, group
    ));
}

/// One line per synchronised checkout
pub fn sync_report(report: &SyncReport) {
    let branch = report.branch.as_deref().unwrap_or("HEAD");
    let dir = report.dir.display();
    let upstream = format!("origin/{}", report.default_branch);

    let message = match &report.outcome {
        SyncOutcome::Cloned => format!("{} cloned into {}", report.project, dir),
        SyncOutcome::CloneFailed { stderr } => {
            format!("{} could not be cloned into {}: {}", report.project, dir, stderr.trim())
        }
        SyncOutcome::Failed { step, stderr } => {
            format!("git {} failed in {}: {}", step, dir, stderr.trim())
        }
        SyncOutcome::LocalChanges => format!("{} has local changes in {}", branch, dir),
        SyncOutcome::NoRemote => format!("{} doesn't have a remote origin {}", branch, dir),
        SyncOutcome::Conflicts => format!("{} conflicts with {} {}", branch, upstream, dir),
        SyncOutcome::UpToDate => format!("{} is up to date in {}", branch, dir),
        SyncOutcome::Pulled => format!("{} pulled changes from {} in {}", branch, upstream, dir),
        SyncOutcome::AlreadyOnDefault => {
            format!("{} is already on {} in {}", branch, upstream, dir)
        }
        SyncOutcome::Rebased => format!("{} was rebased on {} in {}", branch, upstream, dir),
        SyncOutcome::Merged => format!("{} was merged with {} in {}", branch, upstream, dir),
        SyncOutcome::MergeFailed => {
            format!("{} merge with {} failed in {}", branch, upstream, dir)
        }
    };

    if report.outcome.is_problem() {
        failure(&message);
    } else {
        success(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_line_names_cmd_and_dir() {
        let cmd = vec!["docker-compose".to_string(), "up".to_string()];
        let line = started_line(&cmd, Path::new("/work/firecow-example"));

        assert_eq!(
            line,
            "    \x1b[34mdocker-compose up\x1b[0m is running in \x1b[36m/work/firecow-example\x1b[0m"
        );
    }
}
