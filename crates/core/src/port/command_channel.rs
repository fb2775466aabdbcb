// Command Channel Port
// File-based signaling to the supervised app: one outgoing envelope, one incoming status document

use crate::domain::CommandEnvelope;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Replace the pending envelope (last writer wins, no acknowledgment)
    async fn dispatch(&self, envelope: &CommandEnvelope) -> Result<()>;

    /// Current status document written by the app, `None` if absent or unreadable
    async fn read_status(&self) -> Result<Option<Map<String, Value>>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every dispatched envelope
    #[derive(Default)]
    pub struct RecordingCommandChannel {
        sent: Mutex<Vec<CommandEnvelope>>,
        status: Mutex<Option<Map<String, Value>>>,
    }

    impl RecordingCommandChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<CommandEnvelope> {
            self.sent.lock().unwrap().clone()
        }

        pub fn last(&self) -> Option<CommandEnvelope> {
            self.sent.lock().unwrap().last().cloned()
        }

        pub fn set_status(&self, status: Value) {
            *self.status.lock().unwrap() = status.as_object().cloned();
        }
    }

    #[async_trait]
    impl CommandChannel for RecordingCommandChannel {
        async fn dispatch(&self, envelope: &CommandEnvelope) -> Result<()> {
            self.sent.lock().unwrap().push(envelope.clone());
            Ok(())
        }

        async fn read_status(&self) -> Result<Option<Map<String, Value>>> {
            Ok(self.status.lock().unwrap().clone())
        }
    }
}
