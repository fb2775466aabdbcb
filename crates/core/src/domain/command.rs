// Command Envelope Domain Model
//
// The single JSON document used to signal an action to the supervised app.
// Last writer wins; there is no acknowledgment channel.

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Navigation command written when a target screen is requested on start
pub const NAVIGATE_COMMAND: &str = "navigate";

/// Scenario directive that is handled by the sender, not by the app
pub const WAIT_COMMAND: &str = "wait";

/// Screenshot directive
pub const CAPTURE_COMMAND: &str = "capture";

/// Command envelope (`{ command, params, timestamp }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command: String,
    #[serde(default = "empty_params")]
    pub params: Value,
    /// Issue time, epoch ms
    pub timestamp: i64,
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

impl CommandEnvelope {
    /// Build an envelope, validating the command name and params shape.
    ///
    /// `params` of `None` or JSON `null` becomes an empty object.
    pub fn new(command: impl Into<String>, params: Option<Value>, timestamp: i64) -> Result<Self> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "command name must not be empty".to_string(),
            ));
        }

        let params = match params {
            None | Some(Value::Null) => empty_params(),
            Some(Value::Object(map)) => Value::Object(map),
            Some(other) => {
                return Err(DomainError::ValidationError(format!(
                    "params must be a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        Ok(Self {
            command,
            params,
            timestamp,
        })
    }

    /// `navigate` envelope targeting a screen
    pub fn navigate(screen: &str, timestamp: i64) -> Self {
        let mut params = Map::new();
        params.insert("screen".to_string(), Value::String(screen.to_string()));
        Self {
            command: NAVIGATE_COMMAND.to_string(),
            params: Value::Object(params),
            timestamp,
        }
    }

    pub fn has_params(&self) -> bool {
        self.params.as_object().map(|m| !m.is_empty()).unwrap_or(false)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
