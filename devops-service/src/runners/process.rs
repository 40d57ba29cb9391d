// Process Runner
// Spawns argv commands and shell scripts with tokio, capturing their output

use crate::runners::{ProcessCommand, ProcessExecutor, ProcessOutput, ProcessStatus};

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

/// How long to wait for output readers after killing a timed-out process
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Default executor backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Kill the process after this long (None = no timeout)
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build(command: &ProcessCommand) -> Result<Command, String> {
        match command {
            ProcessCommand::Argv(argv) => {
                let (program, args) = argv
                    .split_first()
                    .ok_or_else(|| "empty command".to_string())?;
                let mut cmd = Command::new(program);
                cmd.args(args);
                Ok(cmd)
            }
            ProcessCommand::Shell { shell, script } => {
                let mut cmd = Command::new(shell);
                cmd.arg("-c").arg(script);
                Ok(cmd)
            }
        }
    }

    fn spawn_failure(program: &str, err: std::io::Error) -> ProcessOutput {
        let reason = if which::which(program).is_err() {
            format!("'{}' was not found in PATH", program)
        } else {
            format!("Failed to spawn '{}': {}", program, err)
        };
        ProcessOutput {
            stdout: String::new(),
            stderr: reason.clone(),
            status: ProcessStatus::FailedToStart(reason),
        }
    }
}

#[async_trait::async_trait]
impl ProcessExecutor for ProcessRunner {
    async fn run(&self, command: &ProcessCommand, working_dir: &Path) -> ProcessOutput {
        let mut cmd = match Self::build(command) {
            Ok(cmd) => cmd,
            Err(reason) => {
                return ProcessOutput {
                    stdout: String::new(),
                    stderr: reason.clone(),
                    status: ProcessStatus::FailedToStart(reason),
                }
            }
        };
        cmd.current_dir(working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(%command, dir = %working_dir.display(), "spawning");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return Self::spawn_failure(command.program(), e),
        };

        // Both streams are piped above
        let stdout_handle = child.stdout.take().map(|s| tokio::spawn(collect_lines(s)));
        let stderr_handle = child.stderr.take().map(|s| tokio::spawn(collect_lines(s)));

        let wait_result = if let Some(timeout) = self.timeout {
            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(result) => result,
                Err(_) => {
                    let _ = child.kill().await;
                    let stdout = drain(stdout_handle, Some(DRAIN_GRACE)).await;
                    let mut stderr = drain(stderr_handle, Some(DRAIN_GRACE)).await;
                    if !stderr.is_empty() {
                        stderr.push('\n');
                    }
                    stderr.push_str(&format!("Process timed out after {:?}", timeout));
                    return ProcessOutput {
                        stdout,
                        stderr,
                        status: ProcessStatus::Exited(None),
                    };
                }
            }
        } else {
            child.wait().await
        };

        let stdout = drain(stdout_handle, None).await;
        let stderr = drain(stderr_handle, None).await;

        let status = match wait_result {
            Ok(status) if status.success() => ProcessStatus::Succeeded,
            Ok(status) => ProcessStatus::Exited(status.code()),
            Err(e) => ProcessStatus::FailedToStart(format!("Failed to wait for process: {}", e)),
        };

        ProcessOutput {
            stdout,
            stderr,
            status,
        }
    }
}

/// Output collected by a reader task. With `grace`, gives up after that
/// long, since a killed process's children may still hold the pipe open.
async fn drain(handle: Option<JoinHandle<String>>, grace: Option<Duration>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    match grace {
        Some(grace) => match tokio::time::timeout(grace, handle).await {
            Ok(joined) => joined.unwrap_or_default(),
            Err(_) => String::new(),
        },
        None => handle.await.unwrap_or_default(),
    }
}

async fn collect_lines<R: AsyncRead + Unpin>(stream: R) -> String {
    let mut lines = BufReader::new(stream).lines();
    let mut output = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&line);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(tokens: &[&str]) -> ProcessCommand {
        ProcessCommand::Argv(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[tokio::test]
    async fn test_argv_success() {
        let runner = ProcessRunner::new();
        let output = runner
            .run(&argv(&["echo", "hello"]), &std::env::temp_dir())
            .await;

        assert_eq!(output.status, ProcessStatus::Succeeded);
        assert_eq!(output.stdout, "hello");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let runner = ProcessRunner::new();
        let output = runner
            .run(
                &ProcessCommand::script("sh", "echo oops >&2; exit 3"),
                &std::env::temp_dir(),
            )
            .await;

        assert_eq!(output.status, ProcessStatus::Exited(Some(3)));
        assert_eq!(output.stderr, "oops");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_value() {
        let runner = ProcessRunner::new();
        let output = runner
            .run(
                &argv(&["definitely-not-a-real-binary-xyz"]),
                &std::env::temp_dir(),
            )
            .await;

        assert!(matches!(output.status, ProcessStatus::FailedToStart(_)));
        assert!(output.stderr.contains("not found in PATH"));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();
        let output = runner.run(&argv(&["pwd"]), dir.path()).await;

        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = ProcessRunner::new().with_timeout(Duration::from_millis(50));
        let output = runner
            .run(&argv(&["sleep", "5"]), &std::env::temp_dir())
            .await;

        assert!(!output.status.success());
        assert!(output.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn test_timeout_keeps_captured_stderr() {
        let runner = ProcessRunner::new().with_timeout(Duration::from_millis(200));
        let output = runner
            .run(
                &ProcessCommand::script("sh", "echo warming up >&2; exec sleep 5"),
                &std::env::temp_dir(),
            )
            .await;

        assert_eq!(output.status, ProcessStatus::Exited(None));
        assert!(output.stderr.starts_with("warming up\n"));
        assert!(output.stderr.ends_with("Process timed out after 200ms"));
    }
}
