// Action Output
// The recorded result of running one task

use crate::planner::{GroupKey, Task};
use crate::runners::{ProcessOutput, ProcessStatus};

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// How a task settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
    Succeeded,
    /// Non-zero exit, `None` when the process was killed
    Failed { exit_code: Option<i32> },
    FailedToStart { reason: String },
}

impl ActionStatus {
    pub fn success(&self) -> bool {
        matches!(self, ActionStatus::Succeeded)
    }
}

impl From<ProcessStatus> for ActionStatus {
    fn from(status: ProcessStatus) -> Self {
        match status {
            ProcessStatus::Succeeded => ActionStatus::Succeeded,
            ProcessStatus::Exited(exit_code) => ActionStatus::Failed { exit_code },
            ProcessStatus::FailedToStart(reason) => ActionStatus::FailedToStart { reason },
        }
    }
}

/// Result of running one task. Produced for successes and failures alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutput {
    pub key: GroupKey,
    pub cmd: Vec<String>,
    pub dir: PathBuf,
    pub stdout: String,
    pub stderr: String,
    #[serde(flatten)]
    pub status: ActionStatus,
    pub duration: Duration,
}

impl ActionOutput {
    pub fn from_process(task: Task, output: ProcessOutput, duration: Duration) -> Self {
        Self {
            key: task.key,
            cmd: task.cmd,
            dir: task.dir,
            stdout: output.stdout,
            stderr: output.stderr,
            status: output.status.into(),
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }
}
