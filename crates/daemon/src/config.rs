//! Daemon configuration from environment variables

use anyhow::{anyhow, bail, Context, Result};
use snapbridge_api_rpc::server::{RpcServerConfig, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use snapbridge_core::application::{SupervisorConfig, SupervisorTimings};
use snapbridge_core::domain::LaunchSpec;
use std::path::{Path, PathBuf};

const DEFAULT_ARTIFACT_DIR: &str = "debug_screenshots";

#[cfg(windows)]
const DEFAULT_RUN_CMD: &str = "gradlew.bat desktop:run";
#[cfg(not(windows))]
const DEFAULT_RUN_CMD: &str = "./gradlew desktop:run";

#[cfg(windows)]
const DEFAULT_BUILD_CMD: &str = "gradlew.bat desktop:build";
#[cfg(not(windows))]
const DEFAULT_BUILD_CMD: &str = "./gradlew desktop:build";

#[cfg(windows)]
const DEFAULT_CLEAN_BUILD_CMD: &str = "gradlew.bat clean desktop:build";
#[cfg(not(windows))]
const DEFAULT_CLEAN_BUILD_CMD: &str = "./gradlew clean desktop:build";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// MCP over stdin/stdout
    Stdio,
    /// jsonrpsee server on localhost
    Tcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub project_root: PathBuf,
    pub artifact_dir: PathBuf,
    pub run_command: String,
    pub build_command: String,
    pub clean_build_command: String,
    pub transport: Transport,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Build from any key lookup; unset and empty values fall back to defaults
    pub fn from_lookup<F>(lookup: F, cwd: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path = |value: String| PathBuf::from(shellexpand::tilde(&value).into_owned());

        let project_root = get("SNAPBRIDGE_PROJECT_ROOT")
            .map(path)
            .map(|p| cwd.join(p))
            .unwrap_or_else(|| cwd.to_path_buf());

        let artifact_dir = get("SNAPBRIDGE_ARTIFACT_DIR")
            .map(path)
            .map(|p| project_root.join(p))
            .unwrap_or_else(|| project_root.join(DEFAULT_ARTIFACT_DIR));

        let transport = match get("SNAPBRIDGE_TRANSPORT").as_deref() {
            None | Some("stdio") => Transport::Stdio,
            Some("tcp") => Transport::Tcp,
            Some(other) => bail!("Invalid SNAPBRIDGE_TRANSPORT '{}' (expected stdio or tcp)", other),
        };

        let rpc_port = match get("SNAPBRIDGE_RPC_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid SNAPBRIDGE_RPC_PORT '{}'", raw))?,
            None => DEFAULT_RPC_PORT,
        };

        let log_format = match get("SNAPBRIDGE_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            project_root,
            artifact_dir,
            run_command: get("SNAPBRIDGE_RUN_CMD").unwrap_or_else(|| DEFAULT_RUN_CMD.to_string()),
            build_command: get("SNAPBRIDGE_BUILD_CMD")
                .unwrap_or_else(|| DEFAULT_BUILD_CMD.to_string()),
            clean_build_command: get("SNAPBRIDGE_CLEAN_BUILD_CMD")
                .unwrap_or_else(|| DEFAULT_CLEAN_BUILD_CMD.to_string()),
            transport,
            rpc_host: get("SNAPBRIDGE_RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string()),
            rpc_port,
            log_format,
            log_dir: get("SNAPBRIDGE_LOG_DIR").map(path),
        })
    }

    pub fn supervisor_config(&self) -> Result<SupervisorConfig> {
        let spec = |line: &str, key: &str| {
            LaunchSpec::parse(line, self.project_root.clone())
                .map_err(|e| anyhow!("Invalid {}: {}", key, e))
        };

        Ok(SupervisorConfig {
            run: spec(&self.run_command, "SNAPBRIDGE_RUN_CMD")?,
            build: spec(&self.build_command, "SNAPBRIDGE_BUILD_CMD")?,
            clean_build: spec(&self.clean_build_command, "SNAPBRIDGE_CLEAN_BUILD_CMD")?,
            timings: SupervisorTimings::default(),
        })
    }

    pub fn rpc_config(&self) -> RpcServerConfig {
        RpcServerConfig {
            host: self.rpc_host.clone(),
            port: self.rpc_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DaemonConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| map.get(key).cloned(), Path::new("/work/game"))
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.project_root, PathBuf::from("/work/game"));
        assert_eq!(
            config.artifact_dir,
            PathBuf::from("/work/game/debug_screenshots")
        );
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.rpc_host, "127.0.0.1");
        assert_eq!(config.rpc_port, 9530);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.log_dir.is_none());

        let supervisor = config.supervisor_config().unwrap();
        assert_eq!(supervisor.run.working_dir, PathBuf::from("/work/game"));
        assert_eq!(supervisor.clean_build.args, vec!["clean", "desktop:build"]);
    }

    #[test]
    fn test_relative_paths_resolve_against_root() {
        let config = config(&[
            ("SNAPBRIDGE_PROJECT_ROOT", "other"),
            ("SNAPBRIDGE_ARTIFACT_DIR", "shots"),
        ])
        .unwrap();
        assert_eq!(config.project_root, PathBuf::from("/work/game/other"));
        assert_eq!(config.artifact_dir, PathBuf::from("/work/game/other/shots"));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("SNAPBRIDGE_TRANSPORT", "tcp"),
            ("SNAPBRIDGE_RPC_PORT", "9999"),
            ("SNAPBRIDGE_LOG_FORMAT", "json"),
            ("SNAPBRIDGE_RUN_CMD", "cargo run --bin game"),
            ("SNAPBRIDGE_ARTIFACT_DIR", "/tmp/shots"),
        ])
        .unwrap();
        assert_eq!(config.transport, Transport::Tcp);
        assert_eq!(config.rpc_config().port, 9999);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.artifact_dir, PathBuf::from("/tmp/shots"));

        let run = config.supervisor_config().unwrap().run;
        assert_eq!(run.program, "cargo");
        assert_eq!(run.args, vec!["run", "--bin", "game"]);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("SNAPBRIDGE_TRANSPORT", "udp")]).is_err());
        assert!(config(&[("SNAPBRIDGE_RPC_PORT", "seventy")]).is_err());
    }
}
