// Selectors
// Turns user selections of projects, actions and groups into initial keys

use crate::config::{Config, WILDCARD};
use crate::planner::graph::GroupKey;

use std::collections::BTreeSet;

/// User-facing alias for the wildcard
pub const ALL_ALIAS: &str = "all";

/// A set of names, or everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    Names(BTreeSet<String>),
}

impl Selector {
    /// Parse a `+`-joined list. `all` and `*` select everything.
    pub fn parse(input: &str) -> Self {
        let names: BTreeSet<String> = input
            .split('+')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| if name == ALL_ALIAS { WILDCARD } else { name })
            .map(String::from)
            .collect();

        if names.contains(WILDCARD) {
            Selector::All
        } else {
            Selector::Names(names)
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Names(names) => names.contains(name),
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Selector::All
    }
}

/// What the user asked to run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub projects: Selector,
    pub actions: Selector,
    pub groups: Selector,
}

impl Selection {
    pub fn new(projects: Selector, actions: Selector, groups: Selector) -> Self {
        Self {
            projects,
            actions,
            groups,
        }
    }

    pub fn parse(actions: &str, groups: &str, projects: &str) -> Self {
        Self::new(
            Selector::parse(projects),
            Selector::parse(actions),
            Selector::parse(groups),
        )
    }

    /// Every `{project, action, group}` in `config` this selection covers.
    /// Names that don't exist are ignored.
    pub fn resolve(&self, config: &Config) -> Vec<GroupKey> {
        config
            .projects
            .iter()
            .filter(|(name, _)| self.projects.matches(name))
            .flat_map(|(project_name, project)| {
                project
                    .actions
                    .iter()
                    .filter(|(name, _)| self.actions.matches(name))
                    .flat_map(move |(action_name, action)| {
                        action
                            .groups
                            .keys()
                            .filter(|group| self.groups.matches(group))
                            .map(move |group| GroupKey::new(project_name, action_name, group))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Project, ProjectAction};

    use std::collections::BTreeMap;

    fn project(actions: &[(&str, &[&str])]) -> Project {
        Project {
            remote: "git@gitlab.com:x/y.git".to_string(),
            default_branch: "main".to_string(),
            priority: None,
            actions: actions
                .iter()
                .map(|(name, groups)| {
                    (
                        name.to_string(),
                        ProjectAction {
                            groups: groups
                                .iter()
                                .map(|g| (g.to_string(), vec!["true".to_string()]))
                                .collect(),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
        }
    }

    fn config() -> Config {
        let mut projects = BTreeMap::new();
        projects.insert(
            "a".to_string(),
            project(&[("start", &["web", "api"]), ("down", &["web"])]),
        );
        projects.insert("b".to_string(), project(&[("start", &["web"])]));
        Config {
            projects,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_alias_and_join() {
        assert_eq!(Selector::parse("all"), Selector::All);
        assert_eq!(Selector::parse("a+*"), Selector::All);
        assert_eq!(
            Selector::parse("a+b"),
            Selector::Names(["a".to_string(), "b".to_string()].into_iter().collect())
        );
    }

    #[test]
    fn test_wildcard_yields_every_triple() {
        let keys = Selection::parse("*", "*", "*").resolve(&config());
        assert_eq!(
            keys,
            vec![
                GroupKey::new("a", "down", "web"),
                GroupKey::new("a", "start", "api"),
                GroupKey::new("a", "start", "web"),
                GroupKey::new("b", "start", "web"),
            ]
        );
    }

    #[test]
    fn test_all_alias_matches_wildcard() {
        let config = config();
        assert_eq!(
            Selection::parse("all", "all", "all").resolve(&config),
            Selection::parse("*", "*", "*").resolve(&config)
        );
    }

    #[test]
    fn test_explicit_selection_is_per_project() {
        let keys = Selection::parse("start", "web", "*").resolve(&config());
        assert_eq!(
            keys,
            vec![
                GroupKey::new("a", "start", "web"),
                GroupKey::new("b", "start", "web"),
            ]
        );
    }

    #[test]
    fn test_unknown_names_are_dropped() {
        let keys = Selection::parse("start", "web", "b+nope").resolve(&config());
        assert_eq!(keys, vec![GroupKey::new("b", "start", "web")]);
        assert!(Selection::parse("nonaction", "nongroup", "*")
            .resolve(&config())
            .is_empty());
    }
}
