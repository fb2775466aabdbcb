// Launch Spec Domain Model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::{DomainError, Result};

/// How to start an external program (supervised app or build tool)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir,
        }
    }

    /// Parse a whitespace separated command line (`./gradlew desktop:run`)
    pub fn parse(command_line: &str, working_dir: PathBuf) -> Result<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next().ok_or_else(|| {
            DomainError::ValidationError("command line must not be empty".to_string())
        })?;
        Ok(Self::new(program, words.collect(), working_dir))
    }

    /// Display form for logs and trace output
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
