// Runners Module
// External command execution behind a trait so scheduling can be tested

pub mod process;

pub use process::ProcessRunner;

use std::fmt;
use std::path::Path;

/// A command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCommand {
    /// Program followed by its arguments
    Argv(Vec<String>),
    /// Script passed to `<shell> -c`
    Shell { shell: String, script: String },
}

impl ProcessCommand {
    pub fn argv<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProcessCommand::Argv(tokens.into_iter().map(Into::into).collect())
    }

    pub fn script(shell: impl Into<String>, script: impl Into<String>) -> Self {
        ProcessCommand::Shell {
            shell: shell.into(),
            script: script.into(),
        }
    }

    /// Executable that gets spawned
    pub fn program(&self) -> &str {
        match self {
            ProcessCommand::Argv(argv) => argv.first().map(String::as_str).unwrap_or(""),
            ProcessCommand::Shell { shell, .. } => shell,
        }
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessCommand::Argv(argv) => write!(f, "{}", argv.join(" ")),
            ProcessCommand::Shell { script, .. } => write!(f, "{}", script),
        }
    }
}

/// How a process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    Succeeded,
    /// Non-zero exit; `None` when terminated by a signal or timeout
    Exited(Option<i32>),
    /// The process could not be spawned
    FailedToStart(String),
}

impl ProcessStatus {
    pub fn success(&self) -> bool {
        matches!(self, ProcessStatus::Succeeded)
    }
}

/// Output captured from one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ProcessStatus,
}

/// Runs external commands. Implementations never fail: spawn errors and
/// non-zero exits are reported through [`ProcessStatus`].
#[async_trait::async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn run(&self, command: &ProcessCommand, working_dir: &Path) -> ProcessOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        assert_eq!(
            ProcessCommand::argv(["docker-compose", "up"]).to_string(),
            "docker-compose up"
        );
        assert_eq!(
            ProcessCommand::script("bash", "echo world").to_string(),
            "echo world"
        );
        assert_eq!(ProcessCommand::script("bash", "x").program(), "bash");
    }
}
