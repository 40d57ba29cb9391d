// Configuration Loader
// Finds, optionally fetches, parses and validates .git-local-devops.yml

use crate::config::models::{Config, UNRESOLVED_GROUP};
use crate::runners::{ProcessCommand, ProcessExecutor};

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_FILE: &str = ".git-local-devops.yml";
pub const ENV_FILE: &str = ".git-local-devops-env";

const REMOTE_PROJECT_KEY: &str = "REMOTE_GIT_PROJECT";
const REMOTE_FILE_KEY: &str = "REMOTE_GIT_PROJECT_FILE";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} doesn't contain an .git-local-devops.yml file", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to fetch {file} from {remote}: {stderr}")]
    RemoteFetch {
        remote: String,
        file: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Loads configuration for a base directory
pub struct ConfigLoader<'a> {
    executor: &'a dyn ProcessExecutor,
    fetch_dir: PathBuf,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(executor: &'a dyn ProcessExecutor) -> Self {
        Self {
            executor,
            fetch_dir: std::env::temp_dir().join("git-local-devops"),
        }
    }

    /// Override where remote config files are extracted to
    pub fn with_fetch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fetch_dir = dir.into();
        self
    }

    /// Load the configuration that applies to `cwd`.
    ///
    /// When an env file names a remote config project, the config file is
    /// pulled from that remote with `git archive`; otherwise the local
    /// `.git-local-devops.yml` is used.
    pub async fn load(&self, cwd: &Path) -> Result<Config, ConfigError> {
        let env_path = cwd.join(ENV_FILE);
        let config_path = if env_path.exists() {
            let env = parse_env_file(&fs::read_to_string(&env_path)?);
            match (env.get(REMOTE_PROJECT_KEY), env.get(REMOTE_FILE_KEY)) {
                (Some(remote), Some(file)) => self.fetch_remote(cwd, remote, file).await?,
                _ => cwd.join(CONFIG_FILE),
            }
        } else {
            cwd.join(CONFIG_FILE)
        };

        if !config_path.exists() {
            return Err(ConfigError::NotFound(cwd.to_path_buf()));
        }

        debug!(path = %config_path.display(), "loading config");
        let content = fs::read_to_string(&config_path)?;
        let mut config = parse_config(&content, &config_path)?;
        config.cwd = cwd.to_path_buf();
        Ok(config)
    }

    async fn fetch_remote(
        &self,
        cwd: &Path,
        remote: &str,
        file: &str,
    ) -> Result<PathBuf, ConfigError> {
        fs::create_dir_all(&self.fetch_dir)?;
        let script = format!(
            "git archive --remote={} master {} | tar -xC {}/",
            remote,
            file,
            self.fetch_dir.display()
        );
        info!(%remote, %file, "fetching remote config");

        let output = self
            .executor
            .run(&ProcessCommand::script("sh", script), cwd)
            .await;
        if !output.status.success() {
            return Err(ConfigError::RemoteFetch {
                remote: remote.to_string(),
                file: file.to_string(),
                stderr: output.stderr,
            });
        }

        Ok(self.fetch_dir.join(file))
    }
}

/// Parse and validate configuration content
pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Structural checks the planner relies on
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    for (project_name, project) in &config.projects {
        for (action_name, action) in &project.actions {
            for (group, cmd) in &action.groups {
                if group == UNRESOLVED_GROUP {
                    return Err(ConfigError::Invalid(format!(
                        "{}/{}: '{}' is reserved and can't be used as a group name",
                        project_name, action_name, UNRESOLVED_GROUP
                    )));
                }
                if cmd.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "{}/{}/{}: command must not be empty",
                        project_name, action_name, group
                    )));
                }
            }
        }
    }

    for (name, check) in &config.startup {
        if let crate::config::StartupCheck::Cmd { cmd, .. } = check {
            if cmd.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "startup check '{}': cmd must not be empty",
                    name
                )));
            }
        }
    }

    Ok(())
}

/// Parse `KEY="value"` lines. Blank lines and `#` comments are skipped.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::{ProcessOutput, ProcessStatus};

    use std::sync::Mutex;

    const MINIMAL: &str = r#"
projects:
  example:
    remote: git@gitlab.com:firecow/example.git
    default_branch: main
    actions:
      start:
        groups:
          firecow.dk: [docker-compose, up]
"#;

    /// Executor that writes a config file where `git archive` would extract it
    struct FakeArchive {
        target: PathBuf,
        scripts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ProcessExecutor for FakeArchive {
        async fn run(&self, command: &ProcessCommand, _working_dir: &Path) -> ProcessOutput {
            self.scripts.lock().unwrap().push(command.to_string());
            fs::write(&self.target, MINIMAL).unwrap();
            ProcessOutput {
                stdout: String::new(),
                stderr: String::new(),
                status: ProcessStatus::Succeeded,
            }
        }
    }

    #[tokio::test]
    async fn test_load_local_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), MINIMAL).unwrap();
        let executor = crate::runners::ProcessRunner::new();

        let config = ConfigLoader::new(&executor).load(dir.path()).await.unwrap();

        assert_eq!(config.cwd, dir.path());
        assert!(config.projects.contains_key("example"));
    }

    #[tokio::test]
    async fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let executor = crate::runners::ProcessRunner::new();

        let err = ConfigLoader::new(&executor)
            .load(dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            format!(
                "{} doesn't contain an .git-local-devops.yml file",
                dir.path().display()
            )
        );
    }

    #[tokio::test]
    async fn test_remote_config_via_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetch_dir = dir.path().join("fetched");
        fs::write(
            dir.path().join(ENV_FILE),
            "REMOTE_GIT_PROJECT_FILE=\".git-local-devops.yml\"\nREMOTE_GIT_PROJECT=\"git@gitlab.com:firecow/example.git\"\n",
        )
        .unwrap();
        let executor = FakeArchive {
            target: fetch_dir.join(CONFIG_FILE),
            scripts: Mutex::new(Vec::new()),
        };

        let config = ConfigLoader::new(&executor)
            .with_fetch_dir(&fetch_dir)
            .load(dir.path())
            .await
            .unwrap();

        assert!(config.projects.contains_key("example"));
        let scripts = executor.scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].starts_with(
            "git archive --remote=git@gitlab.com:firecow/example.git master .git-local-devops.yml | tar -xC"
        ));
    }

    #[test]
    fn test_reserved_group_rejected() {
        let content = r#"
projects:
  a:
    remote: git@gitlab.com:x/a.git
    default_branch: main
    actions:
      start:
        groups:
          "!": [echo]
"#;
        let err = parse_config(content, Path::new("cfg.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_command_rejected() {
        let content = r#"
projects:
  a:
    remote: git@gitlab.com:x/a.git
    default_branch: main
    actions:
      start:
        groups:
          web: []
"#;
        let err = parse_config(content, Path::new("cfg.yml")).unwrap_err();
        assert!(err.to_string().contains("a/start/web"));
    }

    #[test]
    fn test_yaml_syntax_error() {
        let err = parse_config("projects: [unclosed", Path::new("cfg.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_parse_env_file() {
        let env = parse_env_file("# comment\nA=\"one\"\n\nB='two'\nC=three\n");
        assert_eq!(env["A"], "one");
        assert_eq!(env["B"], "two");
        assert_eq!(env["C"], "three");
    }
}
