// Subprocess runner for the external 3DFSC tool
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use fsc3d_core::application::adapter::report::{read_tail, FAILURE_TAIL_LINES};
use fsc3d_core::domain::layout::{STDERR_LOG, STDOUT_LOG};
use fsc3d_core::domain::CommandLine;
use fsc3d_core::port::tool_runner::{
    ExecutionError, ExecutionRequest, ExecutionResult, ExecutionStatus, ToolRunner,
};
use fsc3d_core::port::TimeProvider;

/// Time a cancelled process gets between SIGTERM and SIGKILL
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shell used for activation prefixes (`conda activate ... && tool ...`)
const SHELL: &str = "sh";

/// Subprocess runner
/// Spawns the tool with an explicit environment, output captured to the job's logs
pub struct SubprocessRunner {
    time_provider: Arc<dyn TimeProvider>,
}

enum Exit {
    Finished(std::io::Result<ExitStatus>),
    Cancelled,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new(Arc::new(SystemTimeProvider));
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Build the process: through `sh -c` when an activation prefix is set
    fn command(&self, cmd: &CommandLine) -> Command {
        let mut command = match &cmd.activation {
            Some(activation) if !activation.trim().is_empty() => {
                let mut c = Command::new(SHELL);
                c.arg("-c").arg(cmd.to_shell_string());
                c
            }
            _ => {
                let mut c = Command::new(&cmd.program);
                c.args(&cmd.args);
                c
            }
        };

        // own process group so cancellation reaches the interpreter behind `sh`
        #[cfg(unix)]
        command.process_group(0);

        command
    }

    /// Spawn child process with stdout/stderr going straight to the log files
    fn spawn(&self, request: &ExecutionRequest) -> Result<Child, ExecutionError> {
        let io = |e: std::io::Error| ExecutionError::IoError(e.to_string());
        std::fs::create_dir_all(&request.logs_dir).map_err(io)?;
        let stdout = std::fs::File::create(request.logs_dir.join(STDOUT_LOG)).map_err(io)?;
        let stderr = std::fs::File::create(request.logs_dir.join(STDERR_LOG)).map_err(io)?;

        self.command(&request.command)
            .env_clear()
            .envs(&request.env)
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(e.to_string()))
    }

    /// Terminate with SIGTERM first, then SIGKILL if needed
    async fn terminate(&self, child: &mut Child) -> Result<(), ExecutionError> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                let pgid = Pid::from_raw(pid as i32);
                info!(pid = %pid, "Sending SIGTERM to tool process group");
                if let Err(e) = killpg(pgid, Signal::SIGTERM) {
                    warn!(pid = %pid, error = %e, "SIGTERM failed");
                }

                if tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, child.wait())
                    .await
                    .is_ok()
                {
                    info!(pid = %pid, "Tool exited after SIGTERM");
                    return Ok(());
                }

                warn!(pid = %pid, "Tool did not exit after SIGTERM, sending SIGKILL");
                let _ = killpg(pgid, Signal::SIGKILL);
            }
        }

        child
            .kill()
            .await
            .map_err(|e| ExecutionError::Killed(e.to_string()))
    }

    /// Build execution result from exit status and the tails of the captured logs
    fn build_result(&self, status: ExitStatus, logs_dir: &Path, duration_ms: i64) -> ExecutionResult {
        let read = |name: &str| read_tail(&logs_dir.join(name), FAILURE_TAIL_LINES);

        ExecutionResult {
            status: if status.success() {
                ExecutionStatus::Success
            } else {
                ExecutionStatus::Failed
            },
            exit_code: status.code(),
            duration_ms,
            stdout: read(STDOUT_LOG),
            stderr: read(STDERR_LOG),
        }
    }
}

#[async_trait]
impl ToolRunner for SubprocessRunner {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        info!(
            command = %request.command.to_shell_string(),
            working_dir = %request.working_dir.display(),
            "Starting 3DFSC subprocess"
        );

        let mut child = self.spawn(&request)?;

        let exit = match request.cancel.clone() {
            Some(mut token) => tokio::select! {
                status = child.wait() => Exit::Finished(status),
                _ = token.cancelled() => Exit::Cancelled,
            },
            None => Exit::Finished(child.wait().await),
        };

        let status = match exit {
            Exit::Finished(status) => status.map_err(|e| ExecutionError::IoError(e.to_string()))?,
            Exit::Cancelled => {
                warn!("Cancellation requested, terminating 3DFSC");
                self.terminate(&mut child).await?;
                return Err(ExecutionError::Cancelled);
            }
        };

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_result(status, &request.logs_dir, duration_ms);

        info!(
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "3DFSC subprocess completed"
        );

        Ok(result)
    }
}
