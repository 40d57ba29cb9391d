// Dependency Expansion
// Walks declared cross-project needs into the key graph

use crate::config::{Config, UNRESOLVED_GROUP, WILDCARD};
use crate::planner::graph::{GroupKey, KeyGraph, KeyId};
use crate::planner::PlanError;

use std::collections::HashSet;
use tracing::{debug, warn};

pub struct DependencyExpander<'a> {
    config: &'a Config,
}

impl<'a> DependencyExpander<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Add the transitive needs of every seed to `graph`.
    ///
    /// Each hop looks for the current group in the needed project, falling
    /// back to the wildcard group and then to an unresolved marker. Hops
    /// through an unresolved marker keep looking for the group that led
    /// there.
    pub fn expand(&self, graph: &mut KeyGraph, seeds: &[KeyId]) -> Result<(), PlanError> {
        let mut done: HashSet<(KeyId, String)> = HashSet::new();

        for &seed in seeds {
            let wanted = graph.key(seed).group.clone();
            if done.insert((seed, wanted.clone())) {
                let mut path = Vec::new();
                self.visit(graph, seed, &wanted, &mut path, &mut done)?;
            }
        }

        Ok(())
    }

    fn visit(
        &self,
        graph: &mut KeyGraph,
        id: KeyId,
        wanted: &str,
        path: &mut Vec<KeyId>,
        done: &mut HashSet<(KeyId, String)>,
    ) -> Result<(), PlanError> {
        let key = graph.key(id).clone();
        let Some(action) = self.config.action(&key.project, &key.action) else {
            return Ok(());
        };

        path.push(id);
        for project in &action.needs {
            let dependency = self.resolve_need(project, &key.action, wanted);
            let dep_id = graph.intern(dependency);
            graph.add_need(id, dep_id);

            if let Some(pos) = path.iter().position(|&p| p == dep_id) {
                let cycle: Vec<String> = path[pos..]
                    .iter()
                    .chain(std::iter::once(&dep_id))
                    .map(|&p| graph.key(p).to_string())
                    .collect();
                return Err(PlanError::CyclicDependency(cycle.join(" -> ")));
            }

            // A resolved hop continues under its own group; an unresolved
            // one carries the group it was looking for onward
            let next = graph.key(dep_id);
            let next_wanted = if next.is_unresolved() {
                wanted.to_string()
            } else {
                next.group.clone()
            };
            if done.insert((dep_id, next_wanted.clone())) {
                self.visit(graph, dep_id, &next_wanted, path, done)?;
            }
        }
        path.pop();

        Ok(())
    }

    fn resolve_need(&self, project: &str, action_name: &str, wanted: &str) -> GroupKey {
        let group = match self.config.action(project, action_name) {
            Some(action) if action.has_group(wanted) => wanted,
            Some(action) if action.has_group(WILDCARD) => WILDCARD,
            Some(_) => UNRESOLVED_GROUP,
            None => {
                if !self.config.projects.contains_key(project) {
                    warn!(%project, action = %action_name, "needs references an unknown project");
                }
                UNRESOLVED_GROUP
            }
        };
        debug!(%project, action = %action_name, %group, "resolved need");
        GroupKey::new(project, action_name, group)
    }
}
