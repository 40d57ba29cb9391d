// Tasks
// Binds a planned key to its command, directory and priority

use crate::config::Config;
use crate::planner::graph::GroupKey;
use crate::planner::PlanError;
use crate::project::{project_dir_from_remote, RemoteError};

use serde::Serialize;
use std::path::PathBuf;

/// A runnable unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub key: GroupKey,
    /// Command tokens, program first
    pub cmd: Vec<String>,
    pub dir: PathBuf,
    pub priority: i64,
    /// Keys that must settle before this task starts
    pub needs: Vec<GroupKey>,
}

/// A key that couldn't become a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTask {
    pub key: GroupKey,
    pub reason: String,
}

pub(crate) enum MaterializeError {
    /// The project's remote can't be mapped to a directory; only this task
    /// is affected
    Remote(RemoteError),
    /// The key doesn't exist in configuration; planning is broken
    Inconsistent(PlanError),
}

pub(crate) fn materialize(
    config: &Config,
    key: &GroupKey,
    needs: Vec<GroupKey>,
) -> Result<Task, MaterializeError> {
    let inconsistent = || MaterializeError::Inconsistent(PlanError::Inconsistent(key.clone()));

    let project = config.projects.get(&key.project).ok_or_else(inconsistent)?;
    let action = project.actions.get(&key.action).ok_or_else(inconsistent)?;
    let cmd = action.groups.get(&key.group).ok_or_else(inconsistent)?;

    let dir = project_dir_from_remote(&config.cwd, &project.remote)
        .map_err(MaterializeError::Remote)?;

    Ok(Task {
        key: key.clone(),
        cmd: cmd.clone(),
        dir,
        priority: config.priority_of(&key.project, &key.action),
        needs,
    })
}
