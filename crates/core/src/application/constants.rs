// Application constants (No magic values)
use std::time::Duration;

/// Default number of records returned by `list`
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Settle time after launching the app before `start` returns (10s)
/// Crude readiness heuristic, not a health check
pub const STARTUP_SETTLE: Duration = Duration::from_secs(10);

/// Settle time between stop and the next step of `restart` (2s)
pub const RESTART_SETTLE: Duration = Duration::from_secs(2);

/// Upper bound for one build invocation (5 minutes)
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(300);

/// Delay after each non-`wait` scenario step (1s)
pub const SCENARIO_STEP_DELAY: Duration = Duration::from_millis(1000);

/// Graceful process shutdown timeout before SIGKILL (5 seconds)
pub const GRACEFUL_SHUTDOWN_TIMEOUT_MS: i64 = 5000;

/// Characters of build stdout echoed back on success
pub const BUILD_OUTPUT_TAIL_CHARS: usize = 500;
