//! IDE-side collaborators for simple and wizard commands.

use crate::error::HandlerError;
use crate::request::AgentRequest;
use async_trait::async_trait;
use skillroute_api::{CommandSpec, WizardOutcome};
use std::sync::Mutex;

/// Fire-and-forget invocation of IDE commands.
pub trait IdeCommands: Send + Sync {
    /// Trigger `command_id`; must return without waiting for it to finish
    fn execute_command(&self, command_id: &str);
}

/// Runs interactive multi-step input flows.
///
/// Runners should take answers from `request.input_queue` before asking the
/// user, and stop when `request.token` fires.
#[async_trait]
pub trait WizardRunner: Send + Sync {
    async fn run_wizard(
        &self,
        spec: &CommandSpec,
        request: &AgentRequest,
    ) -> Result<WizardOutcome, HandlerError>;
}

/// Drops every IDE command.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIdeCommands;

impl IdeCommands for NullIdeCommands {
    fn execute_command(&self, command_id: &str) {
        tracing::debug!(command_id, "No IDE attached, command dropped");
    }
}

/// Records triggered IDE commands.
#[derive(Debug, Default)]
pub struct RecordingIdeCommands {
    executed: Mutex<Vec<String>>,
}

impl RecordingIdeCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl IdeCommands for RecordingIdeCommands {
    fn execute_command(&self, command_id: &str) {
        self.executed.lock().unwrap().push(command_id.to_string());
    }
}

/// Runner for hosts without wizard support; every run fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedWizardRunner;

#[async_trait]
impl WizardRunner for UnsupportedWizardRunner {
    async fn run_wizard(
        &self,
        spec: &CommandSpec,
        _request: &AgentRequest,
    ) -> Result<WizardOutcome, HandlerError> {
        Err(HandlerError::message(format!(
            "No wizard runner available for '{}'",
            spec.command_id
        )))
    }
}
