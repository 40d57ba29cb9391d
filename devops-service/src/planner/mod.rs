// Task Planner
// Resolves selections into a deduplicated, dependency-closed set of tasks

pub mod expand;
pub mod graph;
pub mod selector;
pub mod task;

pub use expand::DependencyExpander;
pub use graph::{GroupKey, KeyGraph, KeyId};
pub use selector::{Selection, Selector, ALL_ALIAS};
pub use task::{SkippedTask, Task};

use crate::config::Config;
use task::MaterializeError;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Needs form a loop; the message names every key on it
    #[error("circular dependency detected: {0}")]
    CyclicDependency(String),

    /// A planned key doesn't exist in configuration
    #[error("internal planning error: {0} does not resolve in configuration")]
    Inconsistent(GroupKey),
}

/// Options controlling planning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Expand cross-project `needs`
    pub resolve_needs: bool,
}

impl PlanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            resolve_needs: config.needs,
        }
    }
}

/// Outcome of planning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub tasks: Vec<Task>,
    /// Keys dropped because their project could not be materialised
    pub skipped: Vec<SkippedTask>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.skipped.is_empty()
    }
}

pub struct TaskPlanner<'a> {
    config: &'a Config,
    options: PlanOptions,
}

impl<'a> TaskPlanner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            options: PlanOptions::from_config(config),
        }
    }

    pub fn with_options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    /// Plan from `+`-joined selector strings
    pub fn plan_str(&self, actions: &str, groups: &str, projects: &str) -> Result<Plan, PlanError> {
        self.plan(&Selection::parse(actions, groups, projects))
    }

    pub fn plan(&self, selection: &Selection) -> Result<Plan, PlanError> {
        let graph = self.find_keys(selection)?;
        let mut plan = Plan::default();

        for id in graph.ids() {
            let key = graph.key(id);
            let needs = graph.needs(id).into_iter().cloned().collect();
            match task::materialize(self.config, key, needs) {
                Ok(task) => plan.tasks.push(task),
                Err(MaterializeError::Remote(e)) => {
                    warn!(%key, error = %e, "skipping task");
                    plan.skipped.push(SkippedTask {
                        key: key.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(MaterializeError::Inconsistent(e)) => return Err(e),
            }
        }

        debug!(
            tasks = plan.tasks.len(),
            skipped = plan.skipped.len(),
            "planned"
        );
        Ok(plan)
    }

    /// The pruned key graph for `selection`
    pub fn find_keys(&self, selection: &Selection) -> Result<KeyGraph, PlanError> {
        let mut graph = KeyGraph::new();
        let seeds: Vec<KeyId> = selection
            .resolve(self.config)
            .into_iter()
            .map(|key| graph.intern(key))
            .collect();

        if self.options.resolve_needs {
            DependencyExpander::new(self.config).expand(&mut graph, &seeds)?;
        }

        let removed = graph.contract_unresolved();
        if removed > 0 {
            debug!(removed, "contracted unresolved dependencies");
        }

        Ok(graph)
    }
}
