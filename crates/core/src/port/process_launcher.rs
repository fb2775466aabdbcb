// Process Launcher Port
// Abstraction for spawning the supervised app and running one-shot build tools

use crate::domain::LaunchSpec;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result of a one-shot execution (build)
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(i64),

    #[error("Process kill failed: {0}")]
    Killed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Handle to a long-running child process
#[async_trait]
pub trait ManagedProcess: Send + Sync {
    /// OS process identifier
    fn pid(&self) -> u32;

    /// Poll liveness without blocking
    ///
    /// Returns false once the process has exited (and reaps it).
    fn is_running(&mut self) -> bool;

    /// Terminate the process and every process it started
    ///
    /// # Errors
    /// - ExecutionError::Killed if the termination signal or tool failed
    async fn terminate(&mut self) -> Result<(), ExecutionError>;
}

/// Process Launcher trait
///
/// Implementations:
/// - SubprocessLauncher: real OS processes (infra-system)
/// - mocks::MockProcessLauncher: in-memory fake for tests
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Spawn a long-running process and return its handle
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    async fn spawn(&self, spec: &LaunchSpec) -> Result<Box<dyn ManagedProcess>, ExecutionError>;

    /// Run a program to completion, capturing its output
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    /// - ExecutionError::Timeout if it does not finish within `timeout`
    async fn run(
        &self,
        spec: &LaunchSpec,
        timeout: Duration,
    ) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock behavior for `run`
    #[derive(Debug, Clone)]
    pub enum MockRunBehavior {
        /// Exit 0 with this stdout
        Success(String),
        /// Exit 1 with this stderr
        Fail(String),
        /// Time out after N ms
        Timeout(i64),
    }

    /// Fake child process; liveness is shared with the launcher
    pub struct MockProcess {
        pid: u32,
        alive: Arc<AtomicBool>,
        fail_terminate: bool,
    }

    #[async_trait]
    impl ManagedProcess for MockProcess {
        fn pid(&self) -> u32 {
            self.pid
        }

        fn is_running(&mut self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        async fn terminate(&mut self) -> Result<(), ExecutionError> {
            if self.fail_terminate {
                return Err(ExecutionError::Killed("access denied".to_string()));
            }
            self.alive.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Mock Process Launcher for testing
    pub struct MockProcessLauncher {
        run_behavior: Mutex<MockRunBehavior>,
        next_pid: AtomicU32,
        spawned: Mutex<Vec<(LaunchSpec, Arc<AtomicBool>)>>,
        runs: Mutex<Vec<LaunchSpec>>,
        fail_spawn: AtomicBool,
        fail_terminate: AtomicBool,
    }

    impl MockProcessLauncher {
        pub fn new(run_behavior: MockRunBehavior) -> Self {
            Self {
                run_behavior: Mutex::new(run_behavior),
                next_pid: AtomicU32::new(4242),
                spawned: Mutex::new(Vec::new()),
                runs: Mutex::new(Vec::new()),
                fail_spawn: AtomicBool::new(false),
                fail_terminate: AtomicBool::new(false),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockRunBehavior::Success("BUILD SUCCESSFUL".to_string()))
        }

        pub fn set_run_behavior(&self, behavior: MockRunBehavior) {
            *self.run_behavior.lock().unwrap() = behavior;
        }

        pub fn set_fail_spawn(&self, fail: bool) {
            self.fail_spawn.store(fail, Ordering::SeqCst);
        }

        /// Processes spawned after this call refuse to terminate
        pub fn set_fail_terminate(&self, fail: bool) {
            self.fail_terminate.store(fail, Ordering::SeqCst);
        }

        pub fn spawn_count(&self) -> usize {
            self.spawned.lock().unwrap().len()
        }

        pub fn run_count(&self) -> usize {
            self.runs.lock().unwrap().len()
        }

        pub fn last_run(&self) -> Option<LaunchSpec> {
            self.runs.lock().unwrap().last().cloned()
        }

        /// Number of spawned processes still alive
        pub fn alive_count(&self) -> usize {
            self.spawned
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, alive)| alive.load(Ordering::SeqCst))
                .count()
        }

        /// Simulate every spawned process exiting on its own
        pub fn exit_all(&self) {
            for (_, alive) in self.spawned.lock().unwrap().iter() {
                alive.store(false, Ordering::SeqCst);
            }
        }
    }

    #[async_trait]
    impl ProcessLauncher for MockProcessLauncher {
        async fn spawn(
            &self,
            spec: &LaunchSpec,
        ) -> Result<Box<dyn ManagedProcess>, ExecutionError> {
            if self.fail_spawn.load(Ordering::SeqCst) {
                return Err(ExecutionError::SpawnFailed(format!(
                    "{}: No such file or directory",
                    spec.program
                )));
            }

            let alive = Arc::new(AtomicBool::new(true));
            self.spawned
                .lock()
                .unwrap()
                .push((spec.clone(), alive.clone()));

            Ok(Box::new(MockProcess {
                pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
                alive,
                fail_terminate: self.fail_terminate.load(Ordering::SeqCst),
            }))
        }

        async fn run(
            &self,
            spec: &LaunchSpec,
            _timeout: Duration,
        ) -> Result<ExecutionResult, ExecutionError> {
            self.runs.lock().unwrap().push(spec.clone());

            let behavior = self.run_behavior.lock().unwrap().clone();
            match behavior {
                MockRunBehavior::Success(stdout) => Ok(ExecutionResult {
                    status: ExecutionStatus::Success,
                    duration_ms: 100,
                    exit_code: Some(0),
                    stdout: Some(stdout),
                    stderr: None,
                }),
                MockRunBehavior::Fail(stderr) => Ok(ExecutionResult {
                    status: ExecutionStatus::Failed,
                    duration_ms: 100,
                    exit_code: Some(1),
                    stdout: None,
                    stderr: Some(stderr),
                }),
                MockRunBehavior::Timeout(ms) => Err(ExecutionError::Timeout(ms)),
            }
        }
    }
}
