// Execution Events
// Progress reporting and event types for task execution

use crate::execution::result::ActionOutput;
use crate::planner::GroupKey;

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sender for execution progress events
pub type ProgressSender = mpsc::UnboundedSender<ExecutionEvent>;

/// Receiver for execution progress events
pub type ProgressReceiver = mpsc::UnboundedReceiver<ExecutionEvent>;

/// Create a new progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted while running a plan
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Run started
    RunStarted {
        total_tasks: usize,
        total_waves: usize,
    },

    /// Run completed
    RunCompleted {
        success: bool,
        failed_tasks: usize,
        duration: Duration,
    },

    /// A priority wave started
    WaveStarted { priority: i64, total_tasks: usize },

    /// Every task of a wave settled
    WaveCompleted {
        priority: i64,
        failed_tasks: usize,
        duration: Duration,
    },

    /// Task is waiting for needed tasks to settle
    TaskBlocked {
        key: GroupKey,
        waiting_on: Vec<GroupKey>,
    },

    /// Task's command was handed to the executor
    TaskStarted {
        key: GroupKey,
        cmd: Vec<String>,
        dir: PathBuf,
    },

    /// Task settled, successfully or not
    TaskCompleted { output: ActionOutput },

    /// Log message
    Log { level: LogLevel, message: String },
}

/// Log level for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
}

impl ExecutionEvent {
    pub fn run_started(total_tasks: usize, total_waves: usize) -> Self {
        Self::RunStarted {
            total_tasks,
            total_waves,
        }
    }

    pub fn run_completed(success: bool, failed_tasks: usize, duration: Duration) -> Self {
        Self::RunCompleted {
            success,
            failed_tasks,
            duration,
        }
    }

    pub fn wave_started(priority: i64, total_tasks: usize) -> Self {
        Self::WaveStarted {
            priority,
            total_tasks,
        }
    }

    pub fn wave_completed(priority: i64, failed_tasks: usize, duration: Duration) -> Self {
        Self::WaveCompleted {
            priority,
            failed_tasks,
            duration,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Warning,
            message: message.into(),
        }
    }
}

/// Helper trait for sending events, ignoring errors (fire-and-forget)
pub trait EventSender {
    fn send_event(&self, event: ExecutionEvent);
}

impl EventSender for ProgressSender {
    fn send_event(&self, event: ExecutionEvent) {
        let _ = self.send(event);
    }
}

impl EventSender for Option<ProgressSender> {
    fn send_event(&self, event: ExecutionEvent) {
        if let Some(sender) = self {
            let _ = sender.send(event);
        }
    }
}
