// Startup Checks
// Preconditions run in the base directory before any project work

use crate::config::{Config, StartupCheck};
use crate::runners::{ProcessCommand, ProcessExecutor};

use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("startup check '{name}' failed{}: {stderr}", .hint.as_deref().map(|h| format!(" ({})", h)).unwrap_or_default())]
pub struct StartupError {
    pub name: String,
    pub hint: Option<String>,
    pub stderr: String,
}

impl StartupCheck {
    pub fn command(&self) -> ProcessCommand {
        match self {
            StartupCheck::Cmd { cmd, .. } => ProcessCommand::argv(cmd.iter().cloned()),
            StartupCheck::Shell { shell, script, .. } => {
                ProcessCommand::script(shell.clone(), script.clone())
            }
        }
    }
}

/// Run every startup check of `config` in order, stopping at the first
/// failure
pub async fn run_startup_checks(
    executor: &dyn ProcessExecutor,
    config: &Config,
) -> Result<(), StartupError> {
    for (name, check) in &config.startup {
        run_check(executor, name, check, &config.cwd).await?;
    }
    Ok(())
}

async fn run_check(
    executor: &dyn ProcessExecutor,
    name: &str,
    check: &StartupCheck,
    cwd: &Path,
) -> Result<(), StartupError> {
    let command = check.command();
    debug!(check = %name, %command, "running startup check");

    let output = executor.run(&command, cwd).await;
    if output.status.success() {
        return Ok(());
    }

    Err(StartupError {
        name: name.to_string(),
        hint: check.hint().map(String::from),
        stderr: output.stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runners::{ProcessOutput, ProcessStatus};

    use std::sync::Mutex;

    /// Fails any command whose text contains `fail`
    #[derive(Default)]
    struct Checks {
        ran: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ProcessExecutor for Checks {
        async fn run(&self, command: &ProcessCommand, _working_dir: &Path) -> ProcessOutput {
            let line = command.to_string();
            self.ran.lock().unwrap().push(line.clone());
            let failed = line.contains("fail");
            ProcessOutput {
                stdout: String::new(),
                stderr: if failed { "boom".to_string() } else { String::new() },
                status: if failed {
                    ProcessStatus::Exited(Some(1))
                } else {
                    ProcessStatus::Succeeded
                },
            }
        }
    }

    fn config(checks: &[(&str, StartupCheck)]) -> Config {
        Config {
            startup: checks
                .iter()
                .map(|(name, check)| (name.to_string(), check.clone()))
                .collect(),
            ..Default::default()
        }
    }

    fn cmd(tokens: &[&str], hint: Option<&str>) -> StartupCheck {
        StartupCheck::Cmd {
            cmd: tokens.iter().map(|t| t.to_string()).collect(),
            hint: hint.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let executor = Checks::default();
        let config = config(&[
            ("a", cmd(&["echo", "world"], None)),
            (
                "b",
                StartupCheck::Shell {
                    shell: "bash".to_string(),
                    script: "echo world".to_string(),
                    hint: None,
                },
            ),
        ]);

        assert!(run_startup_checks(&executor, &config).await.is_ok());
        assert_eq!(*executor.ran.lock().unwrap(), vec!["echo world", "echo world"]);
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let executor = Checks::default();
        let config = config(&[
            ("a", cmd(&["fail"], Some("Install docker"))),
            ("b", cmd(&["echo", "never"], None)),
        ]);

        let err = run_startup_checks(&executor, &config).await.unwrap_err();

        assert_eq!(err.name, "a");
        assert_eq!(err.hint.as_deref(), Some("Install docker"));
        assert_eq!(err.stderr, "boom");
        assert_eq!(err.to_string(), "startup check 'a' failed (Install docker): boom");
        assert_eq!(executor.ran.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checks_run_in_file_order() {
        let executor = Checks::default();
        let config: Config = serde_yaml::from_str(
            r#"
startup:
  zeta_docker_running:
    cmd: [docker, info]
  alpha_compose_login:
    cmd: [docker, login]
"#,
        )
        .unwrap();

        run_startup_checks(&executor, &config).await.unwrap();
        assert_eq!(*executor.ran.lock().unwrap(), vec!["docker info", "docker login"]);
    }

    #[tokio::test]
    async fn test_failure_without_hint() {
        let executor = Checks::default();
        let config = config(&[("docker", cmd(&["fail"], None))]);

        let err = run_startup_checks(&executor, &config).await.unwrap_err();
        assert_eq!(err.to_string(), "startup check 'docker' failed: boom");
    }
}
