// Configuration Data Models
// Types mirroring the .git-local-devops.yml schema

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Group name that stands in for "any group" during selection and
/// dependency fallback
pub const WILDCARD: &str = "*";

/// Reserved group name marking a dependency that could not be resolved
pub const UNRESOLVED_GROUP: &str = "!";

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory all project checkouts live under. Not part of the file,
    /// filled in by the loader.
    #[serde(skip)]
    pub cwd: PathBuf,

    /// Expand cross-project `needs` when planning
    #[serde(default)]
    pub needs: bool,

    /// Checks run before anything else, in file order
    #[serde(default, with = "ordered_map")]
    pub startup: Vec<(String, StartupCheck)>,

    /// Project definitions, keyed by project name
    #[serde(default)]
    pub projects: BTreeMap<String, Project>,

    /// Patterns searched for in captured action output
    #[serde(default)]
    pub search_for: Vec<SearchFor>,
}

/// A project checkout and the actions it can run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Git remote the project is cloned from
    pub remote: String,

    /// Branch that gets pulled directly; other branches are rebased onto it
    pub default_branch: String,

    /// Fallback priority for actions that don't set their own
    #[serde(default)]
    pub priority: Option<i64>,

    #[serde(default)]
    pub actions: BTreeMap<String, ProjectAction>,
}

/// An action a project exposes (e.g. `start`, `down`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectAction {
    #[serde(default)]
    pub priority: Option<i64>,

    /// Group name -> command tokens
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,

    /// Projects whose same-named action must settle first
    #[serde(default)]
    pub needs: Vec<String>,
}

/// A startup check, either an argv or a script for a named shell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartupCheck {
    Cmd {
        cmd: Vec<String>,
        #[serde(default)]
        hint: Option<String>,
    },
    Shell {
        shell: String,
        script: String,
        #[serde(default)]
        hint: Option<String>,
    },
}

impl StartupCheck {
    pub fn hint(&self) -> Option<&str> {
        match self {
            StartupCheck::Cmd { hint, .. } | StartupCheck::Shell { hint, .. } => hint.as_deref(),
        }
    }
}

/// A regex to look for in action output and the hint shown on a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFor {
    pub regex: String,
    pub hint: String,
}

/// (De)serialises a YAML mapping as a list of entries, keeping file order
mod ordered_map {
    use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::collections::HashSet;
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }

    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut seen = HashSet::new();
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                if !seen.insert(key.clone()) {
                    return Err(de::Error::custom(format!("duplicate entry '{}'", key)));
                }
                entries.push((key, value));
            }
            Ok(entries)
        }
    }
}

impl Config {
    /// Look up the action `action` of project `project`
    pub fn action(&self, project: &str, action: &str) -> Option<&ProjectAction> {
        self.projects.get(project)?.actions.get(action)
    }

    /// Effective priority of an action: its own, else its project's, else 0
    pub fn priority_of(&self, project: &str, action: &str) -> i64 {
        let Some(p) = self.projects.get(project) else {
            return 0;
        };
        p.actions
            .get(action)
            .and_then(|a| a.priority)
            .or(p.priority)
            .unwrap_or(0)
    }
}

impl ProjectAction {
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }
}
