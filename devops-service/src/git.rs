// Repository Synchronisation
// Clones missing checkouts and brings existing ones up to date with their default branch

use crate::config::{Config, Project};
use crate::planner::Selector;
use crate::project::{project_dir_from_remote, RemoteError};
use crate::runners::{ProcessCommand, ProcessExecutor, ProcessOutput};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// What happened to one checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    CloneFailed { stderr: String },
    /// A git command needed to inspect the checkout failed
    Failed { step: String, stderr: String },
    /// Uncommitted changes; nothing was touched
    LocalChanges,
    /// Default branch has no upstream
    NoRemote,
    /// Pulling the default branch failed
    Conflicts,
    UpToDate,
    Pulled,
    /// Custom branch already contains the default branch
    AlreadyOnDefault,
    Rebased,
    /// Rebase failed, merge succeeded
    Merged,
    /// Rebase and merge both failed and were aborted
    MergeFailed,
}

impl SyncOutcome {
    /// Needs attention from the user
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            SyncOutcome::CloneFailed { .. }
                | SyncOutcome::Failed { .. }
                | SyncOutcome::LocalChanges
                | SyncOutcome::NoRemote
                | SyncOutcome::Conflicts
                | SyncOutcome::MergeFailed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub project: String,
    pub dir: PathBuf,
    /// Checked-out branch, when known
    pub branch: Option<String>,
    pub default_branch: String,
    pub outcome: SyncOutcome,
}

pub struct GitSync {
    executor: Arc<dyn ProcessExecutor>,
}

impl GitSync {
    pub fn new(executor: Arc<dyn ProcessExecutor>) -> Self {
        Self { executor }
    }

    /// Synchronise every selected project concurrently. Reports are sorted
    /// by project name; projects with an invalid remote are returned as
    /// errors.
    pub async fn sync_all(
        &self,
        config: &Config,
        projects: &Selector,
    ) -> Vec<Result<SyncReport, RemoteError>> {
        let mut set = JoinSet::new();
        let mut results = Vec::new();

        for (name, project) in config.projects.iter().filter(|(n, _)| projects.matches(n)) {
            let dir = match project_dir_from_remote(&config.cwd, &project.remote) {
                Ok(dir) => dir,
                Err(e) => {
                    warn!(project = %name, error = %e, "skipping sync");
                    results.push(Err(e));
                    continue;
                }
            };
            let executor = Arc::clone(&self.executor);
            let name = name.clone();
            let project = project.clone();
            set.spawn(async move { sync_repo(executor.as_ref(), &name, &project, &dir).await });
        }

        let mut reports = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "sync task aborted"),
            }
        }
        reports.sort_by(|a, b| a.project.cmp(&b.project));

        results.extend(reports.into_iter().map(Ok));
        results
    }
}

async fn git(executor: &dyn ProcessExecutor, dir: &Path, args: &[&str]) -> ProcessOutput {
    let argv = std::iter::once("git").chain(args.iter().copied());
    executor.run(&ProcessCommand::argv(argv), dir).await
}

async fn sync_repo(
    executor: &dyn ProcessExecutor,
    name: &str,
    project: &Project,
    dir: &Path,
) -> SyncReport {
    let report = |branch: Option<String>, outcome: SyncOutcome| SyncReport {
        project: name.to_string(),
        dir: dir.to_path_buf(),
        branch,
        default_branch: project.default_branch.clone(),
        outcome,
    };

    if !dir.exists() {
        let parent = dir.parent().unwrap_or(dir);
        let target = dir.to_string_lossy();
        let clone = git(
            executor,
            parent,
            &["clone", project.remote.as_str(), target.as_ref()],
        )
        .await;
        let outcome = if clone.status.success() {
            SyncOutcome::Cloned
        } else {
            SyncOutcome::CloneFailed {
                stderr: clone.stderr,
            }
        };
        return report(None, outcome);
    }

    let head = git(executor, dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await;
    if !head.status.success() {
        return report(
            None,
            SyncOutcome::Failed {
                step: "rev-parse".to_string(),
                stderr: head.stderr,
            },
        );
    }
    let branch = head.stdout.trim().to_string();

    let status = git(executor, dir, &["status", "--porcelain"]).await;
    if !status.status.success() {
        return report(
            Some(branch),
            SyncOutcome::Failed {
                step: "status".to_string(),
                stderr: status.stderr,
            },
        );
    }
    if !status.stdout.trim().is_empty() {
        return report(Some(branch), SyncOutcome::LocalChanges);
    }

    let outcome = if branch == project.default_branch {
        pull_default(executor, dir).await
    } else {
        rebase_onto_default(executor, dir, &project.default_branch).await
    };
    debug!(project = %name, %branch, ?outcome, "synced");

    report(Some(branch), outcome)
}

async fn pull_default(executor: &dyn ProcessExecutor, dir: &Path) -> SyncOutcome {
    let pull = git(executor, dir, &["pull"]).await;
    if !pull.status.success() {
        if pull.stderr.contains("no tracking information") {
            return SyncOutcome::NoRemote;
        }
        return SyncOutcome::Conflicts;
    }
    if pull.stdout.contains("Already up to date") {
        SyncOutcome::UpToDate
    } else {
        SyncOutcome::Pulled
    }
}

async fn rebase_onto_default(
    executor: &dyn ProcessExecutor,
    dir: &Path,
    default_branch: &str,
) -> SyncOutcome {
    let fetch = git(executor, dir, &["fetch"]).await;
    if !fetch.status.success() {
        return SyncOutcome::NoRemote;
    }

    let upstream = format!("origin/{}", default_branch);
    let rebase = git(executor, dir, &["rebase", upstream.as_str()]).await;
    if rebase.status.success() {
        return if rebase.stdout.contains("is up to date") {
            SyncOutcome::AlreadyOnDefault
        } else {
            SyncOutcome::Rebased
        };
    }

    git(executor, dir, &["rebase", "--abort"]).await;
    let merge = git(executor, dir, &["merge", upstream.as_str()]).await;
    if merge.status.success() {
        return SyncOutcome::Merged;
    }

    git(executor, dir, &["merge", "--abort"]).await;
    SyncOutcome::MergeFailed
}
