// Execution Module
// Wave scheduling, progress events and per-task results

pub mod events;
pub mod result;
pub mod scheduler;

// Re-export key types
pub use events::{progress_channel, EventSender, ExecutionEvent, LogLevel, ProgressSender};
pub use result::{ActionOutput, ActionStatus};
pub use scheduler::{waves, RunResult, SchedulerConfig, WaveScheduler};
