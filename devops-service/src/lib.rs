// DevOps Service Library
// Task planning and wave scheduling across locally checked-out git projects

pub mod config;
pub mod error;
pub mod execution;
pub mod git;
pub mod hints;
pub mod planner;
pub mod project;
pub mod runners;
pub mod startup;

// Re-export commonly used types
pub use error::{ServiceError, ServiceResult};

// Re-export configuration types
pub use config::{Config, ConfigError, ConfigLoader, Project, ProjectAction, SearchFor, StartupCheck};

// Re-export planning types
pub use planner::{GroupKey, Plan, PlanError, PlanOptions, Selection, Selector, Task, TaskPlanner};

// Re-export execution types
pub use execution::{
    progress_channel, ActionOutput, ActionStatus, ExecutionEvent, ProgressSender, RunResult,
    SchedulerConfig, WaveScheduler,
};

// Re-export runner types
pub use runners::{ProcessCommand, ProcessExecutor, ProcessOutput, ProcessRunner, ProcessStatus};

pub use git::{GitSync, SyncOutcome, SyncReport};
pub use hints::{search_output_for_hints, HintMatch};
pub use project::{project_dir_from_remote, RemoteError};
pub use startup::{run_startup_checks, StartupError};
