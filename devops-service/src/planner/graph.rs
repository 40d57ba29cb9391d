// Key Graph
// Interned work-item keys and the "needs" edges between them

use crate::config::UNRESOLVED_GROUP;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Identity of one unit of work
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub project: String,
    pub action: String,
    pub group: String,
}

impl GroupKey {
    pub fn new(
        project: impl Into<String>,
        action: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            action: action.into(),
            group: group.into(),
        }
    }

    /// True for the marker of a dependency that could not be resolved
    pub fn is_unresolved(&self) -> bool {
        self.group == UNRESOLVED_GROUP
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.action, self.group)
    }
}

/// Stable handle of an interned key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(usize);

#[derive(Debug, Clone)]
struct KeyNode {
    key: GroupKey,
    needs: BTreeSet<KeyId>,
    removed: bool,
}

/// Arena of keys. Each distinct `{project, action, group}` is stored once;
/// interning the same key twice yields the same id and its needs accumulate.
#[derive(Debug, Clone, Default)]
pub struct KeyGraph {
    nodes: Vec<KeyNode>,
    index: HashMap<GroupKey, KeyId>,
}

impl KeyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id of `key`, inserting it if unseen
    pub fn intern(&mut self, key: GroupKey) -> KeyId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = KeyId(self.nodes.len());
        self.index.insert(key.clone(), id);
        self.nodes.push(KeyNode {
            key,
            needs: BTreeSet::new(),
            removed: false,
        });
        id
    }

    /// Record that `from` needs `to`
    pub fn add_need(&mut self, from: KeyId, to: KeyId) {
        if from != to {
            self.nodes[from.0].needs.insert(to);
        }
    }

    pub fn key(&self, id: KeyId) -> &GroupKey {
        &self.nodes[id.0].key
    }

    /// Keys `id` needs, in insertion order of the needed keys
    pub fn needs(&self, id: KeyId) -> Vec<&GroupKey> {
        self.nodes[id.0]
            .needs
            .iter()
            .map(|need| &self.nodes[need.0].key)
            .collect()
    }

    /// Ids of all keys still in the graph, in insertion order
    pub fn ids(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.removed)
            .map(|(i, _)| KeyId(i))
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every unresolved key, splicing its own needs into the keys
    /// that needed it. Chains of unresolved keys collapse completely, so no
    /// remaining key reaches an unresolved one. Returns how many keys were
    /// removed.
    pub fn contract_unresolved(&mut self) -> usize {
        let unresolved: HashSet<KeyId> = self
            .ids()
            .filter(|id| self.key(*id).is_unresolved())
            .collect();
        if unresolved.is_empty() {
            return 0;
        }

        let contracted: Vec<(KeyId, BTreeSet<KeyId>)> = self
            .ids()
            .filter(|id| !unresolved.contains(id))
            .map(|id| (id, self.resolved_needs(id, &unresolved)))
            .collect();

        for (id, needs) in contracted {
            self.nodes[id.0].needs = needs;
        }
        for id in &unresolved {
            let node = &mut self.nodes[id.0];
            node.removed = true;
            node.needs.clear();
        }

        unresolved.len()
    }

    fn resolved_needs(&self, id: KeyId, unresolved: &HashSet<KeyId>) -> BTreeSet<KeyId> {
        let mut result = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<KeyId> = self.nodes[id.0].needs.iter().copied().collect();

        while let Some(need) = stack.pop() {
            if !seen.insert(need) {
                continue;
            }
            if unresolved.contains(&need) {
                stack.extend(self.nodes[need.0].needs.iter().copied());
            } else if need != id {
                result.insert(need);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(project: &str, group: &str) -> GroupKey {
        GroupKey::new(project, "start", group)
    }

    #[test]
    fn test_intern_is_structural() {
        let mut graph = KeyGraph::new();
        let a = graph.intern(key("a", "web"));
        let again = graph.intern(GroupKey {
            project: "a".to_string(),
            action: "start".to_string(),
            group: "web".to_string(),
        });

        assert_eq!(a, again);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_needs_union_on_collision() {
        let mut graph = KeyGraph::new();
        let c = graph.intern(key("c", "web"));
        let a = graph.intern(key("a", "web"));
        let b = graph.intern(key("b", "web"));

        graph.add_need(c, a);
        let c_again = graph.intern(key("c", "web"));
        graph.add_need(c_again, b);
        graph.add_need(c_again, a);

        assert_eq!(
            graph.needs(c),
            vec![&key("a", "web"), &key("b", "web")]
        );
    }

    #[test]
    fn test_contract_single_unresolved() {
        let mut graph = KeyGraph::new();
        let c = graph.intern(key("c", "web"));
        let b = graph.intern(key("b", UNRESOLVED_GROUP));
        let a = graph.intern(key("a", "web"));
        graph.add_need(c, b);
        graph.add_need(b, a);

        assert_eq!(graph.contract_unresolved(), 1);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.needs(c), vec![&key("a", "web")]);
        assert!(graph.ids().all(|id| !graph.key(id).is_unresolved()));
    }

    #[test]
    fn test_contract_chain_to_fixed_point() {
        let mut graph = KeyGraph::new();
        let d = graph.intern(key("d", "web"));
        let c = graph.intern(key("c", UNRESOLVED_GROUP));
        let b = graph.intern(key("b", UNRESOLVED_GROUP));
        let a = graph.intern(key("a", "web"));
        graph.add_need(d, c);
        graph.add_need(c, b);
        graph.add_need(b, a);

        graph.contract_unresolved();

        assert_eq!(graph.needs(d), vec![&key("a", "web")]);
        assert!(graph.ids().all(|id| !graph.key(id).is_unresolved()));
    }

    #[test]
    fn test_contract_all_unresolved_leaves_no_needs() {
        let mut graph = KeyGraph::new();
        let c = graph.intern(key("c", "web"));
        let b = graph.intern(key("b", UNRESOLVED_GROUP));
        graph.add_need(c, b);

        graph.contract_unresolved();

        assert!(graph.needs(c).is_empty());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_contract_drops_self_reference() {
        let mut graph = KeyGraph::new();
        let a = graph.intern(key("a", "web"));
        let b = graph.intern(key("b", UNRESOLVED_GROUP));
        graph.add_need(a, b);
        graph.add_need(b, a);

        graph.contract_unresolved();

        assert!(graph.needs(a).is_empty());
    }

    #[test]
    fn test_self_edge_ignored() {
        let mut graph = KeyGraph::new();
        let a = graph.intern(key("a", "web"));
        graph.add_need(a, a);
        assert!(graph.needs(a).is_empty());
    }
}
