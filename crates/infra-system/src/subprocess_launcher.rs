// Subprocess launcher implementation
// reason: tokio for async process management, nix for process-group signals
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use snapbridge_core::application::constants::GRACEFUL_SHUTDOWN_TIMEOUT_MS;
use snapbridge_core::domain::LaunchSpec;
use snapbridge_core::port::process_launcher::{
    ExecutionError, ExecutionResult, ExecutionStatus, ManagedProcess, ProcessLauncher,
};
use snapbridge_core::port::TimeProvider;

/// Log target for output captured from the supervised app
const APP_OUTPUT_TARGET: &str = "snapbridge::app";

/// Interval between liveness checks while waiting for a graceful exit
const TERMINATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawns the supervised app and one-shot build tools as OS processes
///
/// Children never inherit our stdout (it may carry the protocol stream);
/// their output is piped and forwarded to tracing.
pub struct SubprocessLauncher {
    time_provider: Arc<dyn TimeProvider>,
}

impl SubprocessLauncher {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    fn command(spec: &LaunchSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // New process group so the whole tree can be signalled at once
        #[cfg(unix)]
        command.process_group(0);

        command
    }

    /// Spawn child process and wait for output
    async fn spawn_and_wait(
        &self,
        spec: &LaunchSpec,
        limit: Duration,
    ) -> Result<std::process::Output, ExecutionError> {
        let child = Self::command(spec)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(spec, e))?;

        let pid = child.id();

        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExecutionError::IoError(e.to_string())),
            Err(_) => {
                // kill_on_drop only reaches the direct child
                if let Some(pid) = pid {
                    warn!(pid = pid, "Subprocess timed out, killing process tree");
                    kill_tree(pid).await;
                }
                Err(ExecutionError::Timeout(limit.as_millis() as i64))
            }
        }
    }

    /// Build execution result from process output
    fn build_result(output: std::process::Output, duration_ms: i64) -> ExecutionResult {
        let status = if output.status.success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };

        ExecutionResult {
            status,
            exit_code: output.status.code(),
            duration_ms,
            stdout: Some(String::from_utf8_lossy(&output.stdout).to_string()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        }
    }
}

fn spawn_error(spec: &LaunchSpec, e: std::io::Error) -> ExecutionError {
    ExecutionError::SpawnFailed(format!(
        "{} (in {}): {}",
        spec.program,
        spec.working_dir.display(),
        e
    ))
}

/// SIGKILL the whole process group; a group that is already gone is fine
#[cfg(unix)]
async fn kill_tree(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid = pid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(windows)]
async fn kill_tree(pid: u32) {
    if let Err(e) = taskkill(pid).await {
        warn!(pid = pid, error = %e, "Failed to kill process tree");
    }
}

#[cfg(windows)]
async fn taskkill(pid: u32) -> std::io::Result<std::process::Output> {
    Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/T", "/F"])
        .output()
        .await
}

/// Forward each line of a child stream to tracing
fn drain_output<R>(reader: R, pid: u32, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!(target: APP_OUTPUT_TARGET, pid = pid, stream = stream, "{}", line)
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(target: APP_OUTPUT_TARGET, pid = pid, error = %e, "Output stream closed");
                    break;
                }
            }
        }
    });
}

#[async_trait]
impl ProcessLauncher for SubprocessLauncher {
    async fn spawn(&self, spec: &LaunchSpec) -> Result<Box<dyn ManagedProcess>, ExecutionError> {
        let mut child = Self::command(spec)
            .spawn()
            .map_err(|e| spawn_error(spec, e))?;

        let pid = child
            .id()
            .ok_or_else(|| ExecutionError::SpawnFailed("process exited before start".into()))?;

        if let Some(stdout) = child.stdout.take() {
            drain_output(stdout, pid, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            drain_output(stderr, pid, "stderr");
        }

        info!(pid = pid, command = %spec.command_line(), "Spawned child process");

        Ok(Box::new(SpawnedProcess {
            child,
            pid,
            time_provider: self.time_provider.clone(),
        }))
    }

    async fn run(
        &self,
        spec: &LaunchSpec,
        limit: Duration,
    ) -> Result<ExecutionResult, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        info!(
            command = %spec.command_line(),
            working_dir = %spec.working_dir.display(),
            timeout_ms = limit.as_millis() as u64,
            "Starting subprocess execution"
        );

        let output = self.spawn_and_wait(spec, limit).await?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = Self::build_result(output, duration_ms);

        info!(
            command = %spec.command_line(),
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Subprocess execution completed"
        );

        Ok(result)
    }
}

/// Long-running child spawned by `SubprocessLauncher`
pub struct SpawnedProcess {
    child: Child,
    pid: u32,
    time_provider: Arc<dyn TimeProvider>,
}

impl SpawnedProcess {
    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    /// SIGTERM the process group, then SIGKILL if it outlives the grace period
    #[cfg(unix)]
    async fn kill_graceful(&mut self) -> Result<(), ExecutionError> {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let group = Pid::from_raw(self.pid as i32);

        info!(pid = %self.pid, "Sending SIGTERM to process group");
        match killpg(group, Signal::SIGTERM) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Ok(()),
            Err(e) => return Err(ExecutionError::Killed(format!("SIGTERM failed: {}", e))),
        }

        let start_time = self.time_provider.now_millis();
        loop {
            tokio::time::sleep(TERMINATE_POLL_INTERVAL).await;

            if self.has_exited() {
                info!(pid = %self.pid, "Process exited gracefully after SIGTERM");
                return Ok(());
            }

            if self.time_provider.now_millis() - start_time > GRACEFUL_SHUTDOWN_TIMEOUT_MS {
                warn!(pid = %self.pid, "Process did not exit after SIGTERM, sending SIGKILL");
                match killpg(group, Signal::SIGKILL) {
                    Ok(()) | Err(Errno::ESRCH) => {}
                    Err(e) => {
                        return Err(ExecutionError::Killed(format!("SIGKILL failed: {}", e)))
                    }
                }
                self.child
                    .wait()
                    .await
                    .map_err(|e| ExecutionError::IoError(e.to_string()))?;
                return Ok(());
            }
        }
    }

    /// taskkill with /T takes the whole tree down
    #[cfg(windows)]
    async fn kill_graceful(&mut self) -> Result<(), ExecutionError> {
        info!(pid = %self.pid, "Killing process tree on Windows");
        let output = taskkill(self.pid)
            .await
            .map_err(|e| ExecutionError::Killed(e.to_string()))?;

        if !output.status.success() && !self.has_exited() {
            return Err(ExecutionError::Killed(format!(
                "taskkill failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ManagedProcess for SpawnedProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_running(&mut self) -> bool {
        !self.has_exited()
    }

    async fn terminate(&mut self) -> Result<(), ExecutionError> {
        if self.has_exited() {
            return Ok(());
        }
        self.kill_graceful().await
    }
}
