//! skillroute-api: Shared types for the skillroute dispatch engine
//!
//! This crate defines the values that travel between the router, the skills it
//! dispatches to, and extension processes that expose commands to it.
//! Communication across the extension boundary uses MessagePack serialization.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API version for compatibility checking across the extension boundary
pub const API_VERSION: u32 = 1;

// ============================================================================
// Commands
// ============================================================================

/// How a registered command is executed once selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Interactive multi-step input flow
    Wizard,
    /// Fire-and-forget IDE command invocation
    Simple,
    /// Handler returning a structured result, possibly dispatching further
    Skill,
}

/// Descriptor of an invokable command, owned by exactly one registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Slash-command name (unique within its registry, e.g. "createFunctionApp")
    pub name: String,

    /// Opaque handle to the action behind the command
    pub command_id: String,

    /// Human-readable name for listings
    pub display_name: String,

    /// Free text handed to the intent classifier
    #[serde(default)]
    pub intent_description: Option<String>,

    /// Refuse to run without an open workspace
    #[serde(default)]
    pub requires_workspace_open: bool,

    /// Refuse to run without a signed-in Azure account
    #[serde(default)]
    pub requires_azure_login: bool,

    /// Execution discriminator
    pub kind: CommandKind,
}

impl CommandSpec {
    /// Create a command spec of the given kind; display name defaults to the name
    pub fn new(kind: CommandKind, name: impl Into<String>, command_id: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            command_id: command_id.into(),
            intent_description: None,
            requires_workspace_open: false,
            requires_azure_login: false,
            kind,
        }
    }

    /// Skill command (structured handler)
    pub fn skill(name: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self::new(CommandKind::Skill, name, command_id)
    }

    /// Wizard command (multi-step input flow)
    pub fn wizard(name: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self::new(CommandKind::Wizard, name, command_id)
    }

    /// Simple command (fire-and-forget)
    pub fn simple(name: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self::new(CommandKind::Simple, name, command_id)
    }

    /// Set display name
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the description used for intent classification
    pub fn intent(mut self, description: impl Into<String>) -> Self {
        self.intent_description = Some(description.into());
        self
    }

    /// Require an open workspace
    pub fn requires_workspace(mut self) -> Self {
        self.requires_workspace_open = true;
        self
    }

    /// Require a signed-in Azure account
    pub fn requires_login(mut self) -> Self {
        self.requires_azure_login = true;
        self
    }
}

// ============================================================================
// Results
// ============================================================================

/// A suggested next prompt surfaced to the user after a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followup {
    /// Prompt submitted when the follow-up is picked
    pub prompt: String,

    /// Label shown instead of the prompt
    #[serde(default)]
    pub label: Option<String>,

    /// Slash command the prompt is addressed to
    #[serde(default)]
    pub command: Option<String>,
}

impl Followup {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            label: None,
            command: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// A button rendered into the response stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub title: String,
    pub command_id: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl ButtonSpec {
    pub fn new(title: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            command_id: command_id.into(),
            arguments: Vec::new(),
        }
    }
}

/// Core metadata attached to every dispatched result.
///
/// `handler_chain` and `result_id` are owned by the dispatcher and overwritten
/// on the way out; skills put their own data in `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Names of the handlers that processed the turn, outermost first
    #[serde(default)]
    pub handler_chain: Vec<String>,

    /// Identifier generated per dispatch, used to look up follow-ups
    #[serde(default)]
    pub result_id: String,

    /// Skill-specific auxiliary data
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// Result of a chat turn as seen by the IDE
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatAgentResult {
    /// Message rendered to the user
    #[serde(default)]
    pub message: Option<String>,

    pub metadata: ResultMetadata,
}

/// What a skill hands back to the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillCommandResult {
    pub chat_agent_result: ChatAgentResult,

    #[serde(default)]
    pub follow_up: Option<Vec<Followup>>,
}

impl SkillCommandResult {
    /// Result carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            chat_agent_result: ChatAgentResult {
                message: Some(message.into()),
                metadata: ResultMetadata::default(),
            },
            follow_up: None,
        }
    }

    /// Attach follow-up suggestions
    pub fn with_follow_ups(mut self, follow_ups: Vec<Followup>) -> Self {
        self.follow_up = Some(follow_ups);
        self
    }

    /// Attach an auxiliary metadata entry
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.chat_agent_result
            .metadata
            .extensions
            .insert(key.into(), value);
        self
    }

    /// The handler chain recorded on this result
    pub fn handler_chain(&self) -> &[String] {
        &self.chat_agent_result.metadata.handler_chain
    }

    /// The result identifier recorded on this result
    pub fn result_id(&self) -> &str {
        &self.chat_agent_result.metadata.result_id
    }

    /// Number of follow-ups carried
    pub fn follow_up_count(&self) -> usize {
        self.follow_up.as_ref().map(Vec::len).unwrap_or(0)
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

/// Declarative routing benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub name: String,
    pub steps: Vec<BenchmarkStep>,
}

/// One prompt of a benchmark and the outcomes accepted for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkStep {
    pub prompt: String,

    /// Alternative chains that count as correct routing.
    ///
    /// Classification is not deterministic, so several chains may be listed.
    #[serde(default)]
    pub acceptable_handler_chains: Vec<Vec<String>>,

    #[serde(default)]
    pub follow_ups: Option<ExpectedFollowUps>,

    #[serde(default)]
    pub buttons: Option<ExpectedButtons>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedFollowUps {
    #[serde(default)]
    pub required: Vec<Followup>,
    #[serde(default)]
    pub optional: Vec<Followup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedButtons {
    #[serde(default)]
    pub required: Vec<ButtonSpec>,
    #[serde(default)]
    pub optional: Vec<ButtonSpec>,
}

impl BenchmarkConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: BenchmarkStep) -> Self {
        self.steps.push(step);
        self
    }
}

impl BenchmarkStep {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            acceptable_handler_chains: Vec::new(),
            follow_ups: None,
            buttons: None,
        }
    }

    /// Add an acceptable handler chain
    pub fn accept<I, S>(mut self, chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acceptable_handler_chains
            .push(chain.into_iter().map(Into::into).collect());
        self
    }

    /// Add a follow-up that must be offered
    pub fn require_follow_up(mut self, follow_up: Followup) -> Self {
        self.follow_ups
            .get_or_insert_with(ExpectedFollowUps::default)
            .required
            .push(follow_up);
        self
    }

    /// Add a button that must be rendered
    pub fn require_button(mut self, button: ButtonSpec) -> Self {
        self.buttons
            .get_or_insert_with(ExpectedButtons::default)
            .required
            .push(button);
        self
    }

    /// Whether `chain` is one of the acceptable chains
    pub fn accepts_chain(&self, chain: &[String]) -> bool {
        self.acceptable_handler_chains
            .iter()
            .any(|accepted| accepted.as_slice() == chain)
    }
}

// ============================================================================
// Extension Contract
// ============================================================================

/// Answer to "what commands do you expose"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    /// API version for compatibility
    pub api_version: u32,

    /// Declared extension version (semver)
    pub version: String,

    /// Commands the extension exposes to the router
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

impl ExtensionManifest {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION,
            version: version.into(),
            commands: Vec::new(),
        }
    }

    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.commands.push(spec);
        self
    }
}

/// Command identifiers an extension answers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCommandIds {
    pub get_commands: String,
    pub run_wizard_dry: String,
    pub run_wizard_with_inputs: String,
    pub get_benchmarks: String,
}

impl ExtensionCommandIds {
    /// Well-known ids under an extension's command prefix
    pub fn for_extension(prefix: &str) -> Self {
        Self {
            get_commands: format!("{}.getAgentCommands", prefix),
            run_wizard_dry: format!("{}.runWizardCommandWithoutExecution", prefix),
            run_wizard_with_inputs: format!("{}.runWizardCommandWithInputs", prefix),
            get_benchmarks: format!("{}.getAgentBenchmarkConfigs", prefix),
        }
    }
}

/// Request to run one of an extension's wizard commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardInvocation {
    /// Command id as declared in the extension manifest
    pub command_id: String,

    /// Prompt text of the turn that selected the wizard
    #[serde(default)]
    pub prompt: String,

    /// Pre-supplied answers, consumed in order before asking the user
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Gather inputs but do not execute the final action
    #[serde(default)]
    pub dry_run: bool,
}

/// Outcome of a wizard run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardOutcome {
    /// Whether the final action ran
    pub executed: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub follow_up: Vec<Followup>,

    /// Answers gathered during the run, in prompt order
    #[serde(default)]
    pub collected_inputs: Vec<String>,
}

/// Reply envelope for every extension call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionReply<T> {
    Success(T),
    Error(ReplyError),
}

/// Error details from an extension call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyError {
    /// 1 = caller error (unknown command, bad input), 101 = extension failure
    pub code: u8,
    pub message: String,
}

impl<T> ExtensionReply<T> {
    pub fn success(value: T) -> Self {
        Self::Success(value)
    }

    /// Caller error (code 1)
    pub fn user_error(message: impl Into<String>) -> Self {
        Self::Error(ReplyError {
            code: 1,
            message: message.into(),
        })
    }

    /// Extension failure (code 101)
    pub fn system_error(message: impl Into<String>) -> Self {
        Self::Error(ReplyError {
            code: 101,
            message: message.into(),
        })
    }

    pub fn into_result(self) -> Result<T, ReplyError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Error(err) => Err(err),
        }
    }
}

// ============================================================================
// Wire Encoding
// ============================================================================

/// Errors from MessagePack encoding/decoding
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("Encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Decoding failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Encode a value as MessagePack (field names included)
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a MessagePack value
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_serialization() {
        let manifest = ExtensionManifest::new("1.4.0").command(
            CommandSpec::wizard("createFunctionApp", "azureFunctions.createFunctionApp")
                .display_name("Create Function App")
                .intent("Create a new function app in Azure")
                .requires_login(),
        );

        let bytes = encode(&manifest).unwrap();
        let decoded: ExtensionManifest = decode(&bytes).unwrap();

        assert_eq!(decoded.api_version, API_VERSION);
        assert_eq!(decoded.version, "1.4.0");
        assert_eq!(decoded.commands.len(), 1);
        assert_eq!(decoded.commands[0].kind, CommandKind::Wizard);
        assert!(decoded.commands[0].requires_azure_login);
        assert!(!decoded.commands[0].requires_workspace_open);
    }

    #[test]
    fn test_reply_error_serialization() {
        let reply: ExtensionReply<WizardOutcome> = ExtensionReply::user_error("unknown wizard");
        let bytes = encode(&reply).unwrap();
        let decoded: ExtensionReply<WizardOutcome> = decode(&bytes).unwrap();

        match decoded.into_result() {
            Err(err) => {
                assert_eq!(err.code, 1);
                assert_eq!(err.message, "unknown wizard");
            }
            Ok(_) => panic!("Expected error"),
        }
    }

    #[test]
    fn test_benchmark_step_accepts_any_listed_chain() {
        let step = BenchmarkStep::new("create a function app")
            .accept(["functions", "createFunctionApp"])
            .accept(["appService", "createWebApp"]);

        let chain = vec!["appService".to_string(), "createWebApp".to_string()];
        assert!(step.accepts_chain(&chain));
        assert!(!step.accepts_chain(&chain[..1]));
    }

    #[test]
    fn test_benchmark_config_from_json() {
        let json = r#"{
            "name": "functions",
            "steps": [
                {
                    "prompt": "/functions create",
                    "acceptable_handler_chains": [["functions", "createFunctionApp"]],
                    "follow_ups": { "required": [{ "prompt": "deploy it" }] }
                }
            ]
        }"#;

        let config: BenchmarkConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.steps.len(), 1);
        let step = &config.steps[0];
        assert!(step.buttons.is_none());
        assert_eq!(step.follow_ups.as_ref().unwrap().required[0].prompt, "deploy it");
    }

    #[test]
    fn test_extension_command_ids() {
        let ids = ExtensionCommandIds::for_extension("azureFunctions");
        assert_eq!(ids.get_commands, "azureFunctions.getAgentCommands");
        assert_eq!(ids.get_benchmarks, "azureFunctions.getAgentBenchmarkConfigs");
    }
}
