// Wave Scheduler
// Runs tasks wave by wave in priority order, honouring needs within a wave

use crate::execution::events::{EventSender, ExecutionEvent, ProgressSender};
use crate::execution::result::ActionOutput;
use crate::planner::{GroupKey, Task};
use crate::runners::{ProcessCommand, ProcessExecutor, ProcessOutput, ProcessStatus};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// Configuration for task execution
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Maximum tasks in flight at once (0 = unlimited)
    pub max_parallel: usize,
}

/// Result of running a plan
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Every output, wave by wave, in completion order within a wave
    pub outputs: Vec<ActionOutput>,
    pub duration: Duration,
    pub success: bool,
}

impl RunResult {
    pub fn failed(&self) -> impl Iterator<Item = &ActionOutput> {
        self.outputs.iter().filter(|o| !o.success())
    }
}

/// Group tasks by priority, lowest first
pub fn waves(tasks: Vec<Task>) -> Vec<(i64, Vec<Task>)> {
    let mut by_priority: BTreeMap<i64, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        by_priority.entry(task.priority).or_default().push(task);
    }
    by_priority.into_iter().collect()
}

pub struct WaveScheduler {
    executor: Arc<dyn ProcessExecutor>,
    config: SchedulerConfig,
    event_tx: Option<ProgressSender>,
}

/// A task whose needs haven't all settled
struct Blocked {
    task: Task,
    waiting_on: HashSet<GroupKey>,
}

impl WaveScheduler {
    pub fn new(executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            executor,
            config: SchedulerConfig::default(),
            event_tx: None,
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Run every task. A wave starts only after the previous one fully
    /// settled. Failures are recorded and never stop the run.
    pub async fn run(&self, tasks: Vec<Task>) -> RunResult {
        let start = Instant::now();
        let waves = waves(tasks);
        let total_tasks: usize = waves.iter().map(|(_, w)| w.len()).sum();

        self.event_tx
            .send_event(ExecutionEvent::run_started(total_tasks, waves.len()));
        info!(tasks = total_tasks, waves = waves.len(), "run started");

        // Keys of each wave still to come, to spot needs pointing forward
        let mut upcoming: HashMap<GroupKey, i64> = waves
            .iter()
            .flat_map(|(priority, tasks)| tasks.iter().map(|t| (t.key.clone(), *priority)))
            .collect();

        for task in waves.iter().flat_map(|(_, tasks)| tasks) {
            for need in task.needs.iter().filter(|n| !upcoming.contains_key(*n)) {
                debug!(task = %task.key, need = %need, "need not in run, treating as settled");
                self.event_tx.send_event(ExecutionEvent::info(format!(
                    "{} needs {}, which is not part of this run",
                    task.key, need
                )));
            }
        }

        let semaphore = (self.config.max_parallel > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_parallel)));

        let mut history = Vec::with_capacity(total_tasks);
        for (priority, tasks) in waves {
            for task in &tasks {
                upcoming.remove(&task.key);
            }
            let outputs = self
                .run_wave(priority, tasks, &upcoming, semaphore.clone())
                .await;
            history.extend(outputs);
        }

        let duration = start.elapsed();
        let failed_tasks = history.iter().filter(|o| !o.success()).count();
        let success = failed_tasks == 0;

        self.event_tx
            .send_event(ExecutionEvent::run_completed(success, failed_tasks, duration));
        info!(success, failed = failed_tasks, "run completed");

        RunResult {
            outputs: history,
            duration,
            success,
        }
    }

    async fn run_wave(
        &self,
        priority: i64,
        tasks: Vec<Task>,
        later: &HashMap<GroupKey, i64>,
        semaphore: Option<Arc<Semaphore>>,
    ) -> Vec<ActionOutput> {
        let start = Instant::now();
        let total = tasks.len();
        self.event_tx
            .send_event(ExecutionEvent::wave_started(priority, total));
        debug!(priority, tasks = total, "wave started");

        let in_wave: HashSet<GroupKey> = tasks.iter().map(|t| t.key.clone()).collect();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<ActionOutput>();

        let mut blocked = Vec::new();
        let mut running = 0usize;

        for task in tasks {
            let waiting_on = self.unmet_needs(&task, &in_wave, later);
            if waiting_on.is_empty() {
                self.start_task(task, &done_tx, semaphore.clone());
                running += 1;
            } else {
                self.event_tx.send_event(ExecutionEvent::TaskBlocked {
                    key: task.key.clone(),
                    waiting_on: waiting_on.iter().cloned().collect(),
                });
                blocked.push(Blocked { task, waiting_on });
            }
        }

        let mut outputs = Vec::with_capacity(total);
        while running > 0 || !blocked.is_empty() {
            if running == 0 {
                // Nothing in flight can release the rest; needs within this
                // wave form a loop
                warn!(
                    priority,
                    blocked = blocked.len(),
                    "needs can't be satisfied, starting anyway"
                );
                self.event_tx.send_event(ExecutionEvent::warning(format!(
                    "{} task(s) in wave {} wait on each other; starting them anyway",
                    blocked.len(),
                    priority
                )));
                for b in blocked.drain(..) {
                    self.start_task(b.task, &done_tx, semaphore.clone());
                    running += 1;
                }
                continue;
            }

            let Some(output) = done_rx.recv().await else {
                break;
            };
            running -= 1;

            let settled = output.key.clone();
            self.event_tx.send_event(ExecutionEvent::TaskCompleted {
                output: output.clone(),
            });
            outputs.push(output);

            let mut still_blocked = Vec::with_capacity(blocked.len());
            for mut b in blocked.drain(..) {
                b.waiting_on.remove(&settled);
                if b.waiting_on.is_empty() {
                    self.start_task(b.task, &done_tx, semaphore.clone());
                    running += 1;
                } else {
                    still_blocked.push(b);
                }
            }
            blocked = still_blocked;
        }

        let failed_tasks = outputs.iter().filter(|o| !o.success()).count();
        self.event_tx.send_event(ExecutionEvent::wave_completed(
            priority,
            failed_tasks,
            start.elapsed(),
        ));

        outputs
    }

    /// Needs of `task` that still have to settle inside this wave.
    ///
    /// Needs from earlier waves have settled already. Needs that aren't in
    /// the run at all (e.g. skipped during planning) count as settled. Needs
    /// in a later wave can't be waited for and are dropped with a warning.
    fn unmet_needs(
        &self,
        task: &Task,
        in_wave: &HashSet<GroupKey>,
        later: &HashMap<GroupKey, i64>,
    ) -> HashSet<GroupKey> {
        let mut unmet = HashSet::new();
        for need in &task.needs {
            if in_wave.contains(need) {
                unmet.insert(need.clone());
            } else if let Some(priority) = later.get(need) {
                warn!(task = %task.key, need = %need, "need runs in a later wave, ignoring");
                self.event_tx.send_event(ExecutionEvent::warning(format!(
                    "{} needs {}, which runs later (priority {}); not waiting for it",
                    task.key, need, priority
                )));
            }
        }
        unmet
    }

    fn start_task(
        &self,
        task: Task,
        done_tx: &mpsc::UnboundedSender<ActionOutput>,
        semaphore: Option<Arc<Semaphore>>,
    ) {
        let executor = Arc::clone(&self.executor);
        let event_tx = self.event_tx.clone();
        let done_tx = done_tx.clone();

        tokio::spawn(async move {
            let _permit = match semaphore {
                Some(s) => s.acquire_owned().await.ok(),
                None => None,
            };

            event_tx.send_event(ExecutionEvent::TaskStarted {
                key: task.key.clone(),
                cmd: task.cmd.clone(),
                dir: task.dir.clone(),
            });
            debug!(task = %task.key, "task started");

            let started = Instant::now();
            let command = ProcessCommand::Argv(task.cmd.clone());
            let dir = task.dir.clone();
            let process = tokio::spawn(async move { executor.run(&command, &dir).await })
                .await
                .unwrap_or_else(|e| ProcessOutput {
                    stdout: String::new(),
                    stderr: e.to_string(),
                    status: ProcessStatus::FailedToStart(format!("task aborted: {}", e)),
                });

            let _ = done_tx.send(ActionOutput::from_process(task, process, started.elapsed()));
        });
    }
}
