//! Process Supervisor - lifecycle of the single external app process
//!
//! Owns the tracked process handle and the command channel. At most one
//! process is tracked at a time; a handle whose process has exited on its own
//! is dropped the next time liveness is polled.

use crate::application::constants::{
    BUILD_OUTPUT_TAIL_CHARS, BUILD_TIMEOUT, RESTART_SETTLE, SCENARIO_STEP_DELAY, STARTUP_SETTLE,
};
use crate::domain::{find_scenario, CommandEnvelope, LaunchSpec, ScenarioTrace, SCENARIO_NAMES};
use crate::error::{AppError, Result};
use crate::port::{
    CommandChannel, ExecutionError, IdProvider, ManagedProcess, ProcessLauncher, TimeProvider,
};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Fixed waits used by the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorTimings {
    pub startup_settle: Duration,
    pub restart_settle: Duration,
    pub build_timeout: Duration,
    pub step_delay: Duration,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            startup_settle: STARTUP_SETTLE,
            restart_settle: RESTART_SETTLE,
            build_timeout: BUILD_TIMEOUT,
            step_delay: SCENARIO_STEP_DELAY,
        }
    }
}

/// Commands the supervisor runs
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub run: LaunchSpec,
    pub build: LaunchSpec,
    pub clean_build: LaunchSpec,
    pub timings: SupervisorTimings,
}

/// Result of `start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        pid: u32,
        target_screen: Option<String>,
    },
    AlreadyRunning {
        pid: u32,
    },
}

impl StartOutcome {
    pub fn message(&self) -> String {
        match self {
            StartOutcome::Started { pid, target_screen } => {
                let mut text = format!("App started (PID: {pid})");
                if let Some(target) = target_screen {
                    text.push_str(&format!("\nNavigating to: {target}"));
                }
                text
            }
            StartOutcome::AlreadyRunning { pid } => format!(
                "App is already running (PID: {pid}). Use stop_app first or use restart_app."
            ),
        }
    }
}

/// Result of `stop`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { pid: u32 },
    NotRunning,
    /// Termination failed; the handle is kept so `status` can be re-checked
    Failed { pid: u32, reason: String },
}

impl StopOutcome {
    pub fn message(&self) -> String {
        match self {
            StopOutcome::Stopped { pid } => format!("App stopped successfully (PID: {pid})."),
            StopOutcome::NotRunning => "No app process running.".to_string(),
            StopOutcome::Failed { pid, reason } => {
                format!("Failed to stop app (PID: {pid}): {reason}")
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StopOutcome::Failed { .. })
    }
}

/// Successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub clean: bool,
    pub duration_ms: i64,
    pub output_tail: String,
}

impl BuildReport {
    pub fn message(&self) -> String {
        format!(
            "Build {}completed successfully.\n\nOutput:\n{}",
            if self.clean { "(clean) " } else { "" },
            self.output_tail
        )
    }
}

pub struct ProcessSupervisor {
    launcher: Arc<dyn ProcessLauncher>,
    channel: Arc<dyn CommandChannel>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    config: SupervisorConfig,
    process: Mutex<Option<Box<dyn ManagedProcess>>>,
    last_timestamp: AtomicI64,
}

impl ProcessSupervisor {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        channel: Arc<dyn CommandChannel>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            launcher,
            channel,
            time_provider,
            id_provider,
            config,
            process: Mutex::new(None),
            last_timestamp: AtomicI64::new(0),
        }
    }

    /// Envelope timestamp, strictly increasing within this process.
    ///
    /// The consumer drops envelopes whose timestamp is not newer than the last
    /// one it executed, so two writes in the same millisecond must differ.
    fn next_timestamp(&self) -> i64 {
        let now = self.time_provider.now_millis();
        let mut prev = self.last_timestamp.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self.last_timestamp.compare_exchange(
                prev,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    async fn navigate(&self, target_screen: &str) -> Result<()> {
        let envelope = CommandEnvelope::navigate(target_screen, self.next_timestamp());
        self.channel.dispatch(&envelope).await?;
        info!(target_screen = %target_screen, "Queued navigation");
        Ok(())
    }

    async fn launch(&self, slot: &mut Option<Box<dyn ManagedProcess>>) -> Result<u32> {
        info!(command = %self.config.run.command_line(), "Launching app");
        let process = self.launcher.spawn(&self.config.run).await?;
        let pid = process.pid();
        info!(pid = pid, "App launched");
        *slot = Some(process);
        Ok(pid)
    }

    /// Start the app unless one is already tracked and alive
    ///
    /// # Errors
    /// - AppError::Execution if the app cannot be spawned
    pub async fn start(
        &self,
        target_screen: Option<&str>,
        wait_for_start: bool,
    ) -> Result<StartOutcome> {
        let pid = {
            let mut slot = self.process.lock().await;
            if let Some(pid) = live_pid(&mut slot) {
                info!(pid = pid, "Start requested but app already running");
                return Ok(StartOutcome::AlreadyRunning { pid });
            }
            self.launch(&mut slot).await?
        };

        if let Some(target) = target_screen {
            self.navigate(target).await?;
        }

        if wait_for_start {
            debug!(settle = ?self.config.timings.startup_settle, "Waiting for app to settle");
            tokio::time::sleep(self.config.timings.startup_settle).await;
        }

        Ok(StartOutcome::Started {
            pid,
            target_screen: target_screen.map(str::to_string),
        })
    }

    /// Terminate the tracked process tree. Never fails; see `StopOutcome::Failed`.
    pub async fn stop(&self) -> StopOutcome {
        let mut slot = self.process.lock().await;
        Self::stop_locked(&mut slot).await
    }

    async fn stop_locked(slot: &mut Option<Box<dyn ManagedProcess>>) -> StopOutcome {
        let Some(pid) = live_pid(slot) else {
            return StopOutcome::NotRunning;
        };

        let result = match slot.as_mut() {
            Some(process) => process.terminate().await,
            None => return StopOutcome::NotRunning,
        };

        match result {
            Ok(()) => {
                *slot = None;
                info!(pid = pid, "App stopped");
                StopOutcome::Stopped { pid }
            }
            Err(e) => {
                warn!(pid = pid, error = %e, "Failed to stop app");
                StopOutcome::Failed {
                    pid,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Run the build tool
    ///
    /// # Errors
    /// - AppError::ExternalTool on non-zero exit, timeout or spawn failure
    pub async fn build(&self, clean: bool) -> Result<BuildReport> {
        let spec = if clean {
            &self.config.clean_build
        } else {
            &self.config.build
        };

        info!(command = %spec.command_line(), clean = clean, "Starting build");

        let result = self
            .launcher
            .run(spec, self.config.timings.build_timeout)
            .await
            .map_err(|e| {
                let diagnostics = match e {
                    ExecutionError::Timeout(ms) => format!("build timed out after {ms}ms"),
                    other => other.to_string(),
                };
                warn!(diagnostics = %diagnostics, "Build could not complete");
                AppError::ExternalTool {
                    tool: "Build".to_string(),
                    diagnostics,
                }
            })?;

        if !result.is_success() {
            let diagnostics = [result.stderr.as_deref(), result.stdout.as_deref()]
                .into_iter()
                .flatten()
                .find(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("exit code {:?}", result.exit_code));
            warn!(exit_code = ?result.exit_code, "Build failed");
            return Err(AppError::ExternalTool {
                tool: "Build".to_string(),
                diagnostics,
            });
        }

        info!(duration_ms = result.duration_ms, "Build completed");

        Ok(BuildReport {
            clean,
            duration_ms: result.duration_ms,
            output_tail: tail_chars(result.stdout.as_deref().unwrap_or(""), BUILD_OUTPUT_TAIL_CHARS)
                .to_string(),
        })
    }

    /// Stop (best effort), optionally rebuild, then start again.
    ///
    /// The handle stays locked from stop to relaunch, so a concurrent `start`
    /// waits and then reports the restarted process.
    ///
    /// # Errors
    /// - AppError::ExternalTool if the rebuild fails (nothing is started)
    /// - AppError::Execution if the app cannot be spawned
    pub async fn restart(&self, rebuild: bool, target_screen: Option<&str>) -> Result<String> {
        let mut trace = String::from("Restarting app...\n");

        let pid = {
            let mut slot = self.process.lock().await;

            match Self::stop_locked(&mut slot).await {
                StopOutcome::Stopped { .. } => {
                    tokio::time::sleep(self.config.timings.restart_settle).await;
                    trace.push_str("Stopped existing app.\n");
                }
                StopOutcome::Failed { reason, .. } => {
                    trace.push_str(&format!("Warning: Failed to stop cleanly: {reason}\n"));
                }
                StopOutcome::NotRunning => {}
            }

            if rebuild {
                trace.push_str("Building app...\n");
                self.build(false).await.map_err(|e| match e {
                    AppError::ExternalTool { diagnostics, .. } => AppError::ExternalTool {
                        tool: "Rebuild".to_string(),
                        diagnostics,
                    },
                    other => other,
                })?;
                trace.push_str("Build completed.\n");
            }

            if let Some(old) = live_pid(&mut slot) {
                warn!(pid = old, "Replacing a process that could not be stopped");
            }
            self.launch(&mut slot).await?
        };

        if let Some(target) = target_screen {
            self.navigate(target).await?;
        }

        tokio::time::sleep(self.config.timings.startup_settle).await;

        trace.push_str(&format!("App started (PID: {pid})"));
        if let Some(target) = target_screen {
            trace.push_str(&format!("\nNavigating to: {target}"));
        }

        Ok(trace)
    }

    /// Own liveness fields merged with the app's status document (document keys win)
    pub async fn status(&self) -> Result<Value> {
        let pid = {
            let mut slot = self.process.lock().await;
            live_pid(&mut slot)
        };

        let mut status = Map::new();
        status.insert("running".to_string(), Value::Bool(pid.is_some()));
        status.insert("pid".to_string(), pid.map(Value::from).unwrap_or(Value::Null));

        match self.channel.read_status().await {
            Ok(Some(document)) => status.extend(document),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read status document"),
        }

        Ok(Value::Object(status))
    }

    /// Overwrite the command queue. Fire-and-forget.
    pub async fn send_command(&self, command: &str, params: Option<Value>) -> Result<CommandEnvelope> {
        let envelope = CommandEnvelope::new(command, params, self.next_timestamp())?;
        self.channel.dispatch(&envelope).await?;
        info!(command = %envelope.command, "Command sent");
        Ok(envelope)
    }

    /// Play back a built-in scenario
    ///
    /// # Errors
    /// - AppError::UnknownScenario (nothing is written)
    pub async fn run_scenario(&self, name: &str, capture_steps: bool) -> Result<ScenarioTrace> {
        let scenario = find_scenario(name).ok_or_else(|| AppError::UnknownScenario {
            name: name.to_string(),
            known: SCENARIO_NAMES.iter().map(|s| s.to_string()).collect(),
        })?;

        let run_id = self.id_provider.generate_id();
        info!(
            scenario = %name,
            run_id = %run_id,
            steps = scenario.steps.len(),
            capture_steps = capture_steps,
            "Running scenario"
        );

        let mut trace = ScenarioTrace {
            scenario: name.to_string(),
            run_id,
            ..Default::default()
        };

        for (index, step) in scenario.steps.iter().enumerate() {
            let number = index + 1;

            if !capture_steps && step.is_capture() {
                trace
                    .lines
                    .push(format!("Step {number}: {} (skipped)", step.command));
                trace.steps_skipped += 1;
                continue;
            }

            trace.lines.push(format!("Step {number}: {}", step.command));

            let envelope = CommandEnvelope {
                command: step.command.clone(),
                params: step.params.clone(),
                timestamp: self.next_timestamp(),
            };
            self.channel.dispatch(&envelope).await?;
            trace.steps_sent += 1;

            let delay = step
                .wait_duration()
                .unwrap_or(self.config.timings.step_delay);
            debug!(step = number, command = %step.command, delay = ?delay, "Scenario step sent");
            tokio::time::sleep(delay).await;
        }

        info!(
            scenario = %name,
            run_id = %trace.run_id,
            sent = trace.steps_sent,
            skipped = trace.steps_skipped,
            "Scenario completed"
        );

        Ok(trace)
    }
}

/// Pid of the tracked process if it is still alive; drops a dead handle
fn live_pid(slot: &mut Option<Box<dyn ManagedProcess>>) -> Option<u32> {
    let process = slot.as_mut()?;
    if process.is_running() {
        return Some(process.pid());
    }
    info!(pid = process.pid(), "Supervised process exited on its own");
    *slot = None;
    None
}

/// Last `n` characters of `s`
fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(count - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}
