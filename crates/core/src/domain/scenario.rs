// Scenario Domain Model
//
// A scenario is a fixed, named sequence of command envelopes played back
// against the running app with a delay between steps.

use crate::domain::command::{CAPTURE_COMMAND, WAIT_COMMAND};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

/// One scenario step (envelope without timestamp)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioStep {
    pub command: String,
    pub params: Value,
}

impl ScenarioStep {
    pub fn new(command: &str, params: Value) -> Self {
        Self {
            command: command.to_string(),
            params,
        }
    }

    pub fn is_wait(&self) -> bool {
        self.command == WAIT_COMMAND
    }

    pub fn is_capture(&self) -> bool {
        self.command == CAPTURE_COMMAND
    }

    /// Duration of a `wait` directive (`params.ms`, milliseconds)
    pub fn wait_duration(&self) -> Option<Duration> {
        if !self.is_wait() {
            return None;
        }
        self.params
            .get("ms")
            .and_then(|v| v.as_u64())
            .map(Duration::from_millis)
    }
}

/// Named scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: &'static str,
    pub steps: Vec<ScenarioStep>,
}

/// Names of the built-in scenarios, in catalog order
pub const SCENARIO_NAMES: [&str; 3] = [
    "test_energy_blocks",
    "navigate_all_screens",
    "test_crew_movement",
];

/// Look up a built-in scenario by name
pub fn find_scenario(name: &str) -> Option<Scenario> {
    let steps = match name {
        "test_energy_blocks" => vec![
            ScenarioStep::new("navigate", json!({ "screen": "ShipScreen" })),
            ScenarioStep::new("wait", json!({ "ms": 2000 })),
            ScenarioStep::new("capture", json!({ "name": "energy_blocks_initial" })),
            ScenarioStep::new("click", json!({ "x": 100, "y": 600 })),
            ScenarioStep::new("wait", json!({ "ms": 500 })),
            ScenarioStep::new("capture", json!({ "name": "energy_blocks_powered_1" })),
            ScenarioStep::new("click", json!({ "x": 160, "y": 600 })),
            ScenarioStep::new("wait", json!({ "ms": 500 })),
            ScenarioStep::new("capture", json!({ "name": "energy_blocks_powered_2" })),
        ],
        "navigate_all_screens" => vec![
            ScenarioStep::new("navigate", json!({ "screen": "MainMenu" })),
            ScenarioStep::new("capture", json!({ "name": "main_menu" })),
            ScenarioStep::new("navigate", json!({ "screen": "ShipScreen" })),
            ScenarioStep::new("capture", json!({ "name": "ship_screen" })),
            ScenarioStep::new("navigate", json!({ "screen": "CodexScreen" })),
            ScenarioStep::new("capture", json!({ "name": "codex_screen" })),
        ],
        "test_crew_movement" => vec![
            ScenarioStep::new("navigate", json!({ "screen": "ShipScreen" })),
            ScenarioStep::new("wait", json!({ "ms": 2000 })),
            ScenarioStep::new("capture", json!({ "name": "crew_initial" })),
            ScenarioStep::new("click", json!({ "x": 300, "y": 300 })),
            ScenarioStep::new("wait", json!({ "ms": 500 })),
            ScenarioStep::new("click", json!({ "x": 400, "y": 300, "button": "right" })),
            ScenarioStep::new("wait", json!({ "ms": 2000 })),
            ScenarioStep::new("capture", json!({ "name": "crew_moving" })),
            ScenarioStep::new("wait", json!({ "ms": 3000 })),
            ScenarioStep::new("capture", json!({ "name": "crew_arrived" })),
        ],
        _ => return None,
    };

    let name = SCENARIO_NAMES.iter().find(|n| **n == name)?;
    Some(Scenario { name, steps })
}

/// Scenario execution trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioTrace {
    pub scenario: String,
    pub run_id: String,
    pub lines: Vec<String>,
    pub steps_sent: usize,
    pub steps_skipped: usize,
}

impl ScenarioTrace {
    /// Human readable trace
    pub fn render(&self) -> String {
        let mut out = format!("Executing scenario: {}\n\n", self.scenario);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("\nScenario completed.");
        out
    }
}
