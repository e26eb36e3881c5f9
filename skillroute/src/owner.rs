//! Owners: a registry plus the policy for dispatching into it.
//!
//! An owner can be mounted into a parent registry as a skill command, which
//! is how skill groups nest: the parent selects the owner by name, and the
//! owner resolves again within its own registry.

use crate::chain::HandlerChain;
use crate::coordinator::Coordinator;
use crate::error::HandlerError;
use crate::handler::{SkillCommandArgs, SkillHandler};
use crate::registry::CommandRegistry;
use crate::request::AgentRequest;
use crate::resolver::resolve;
use async_trait::async_trait;
use skillroute_api::{CommandSpec, SkillCommandResult};
use std::fmt;
use std::sync::Arc;

/// A registry of commands addressable as one unit.
pub struct OwnerComposer {
    name: String,
    display_name: String,
    intent_description: Option<String>,
    registry: CommandRegistry,
    hidden: bool,
    intent_detection: bool,
}

impl OwnerComposer {
    pub fn new(name: impl Into<String>, registry: CommandRegistry) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            intent_description: None,
            registry,
            hidden: false,
            intent_detection: true,
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Description used when this owner is mounted and classified as a whole
    pub fn intent(mut self, description: impl Into<String>) -> Self {
        self.intent_description = Some(description.into());
        self
    }

    /// Never list this owner's commands; they stay dispatchable
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Only explicit commands and fallbacks; no classifier calls
    pub fn without_intent_detection(mut self) -> Self {
        self.intent_detection = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn intent_detection(&self) -> bool {
        self.intent_detection
    }

    /// `(name, display_name)` of each command, empty for hidden owners
    pub fn listed_commands(&self) -> Vec<(String, String)> {
        if self.hidden {
            return Vec::new();
        }
        self.registry
            .list()
            .map(|c| (c.spec().name.clone(), c.spec().display_name.clone()))
            .collect()
    }

    /// Resolve `request` in this owner's registry and execute the selection.
    ///
    /// `None` means unresolved: nothing matched, the handler failed, or the
    /// turn was cancelled.
    #[tracing::instrument(
        name = "owner.dispatch",
        skip_all,
        fields(owner = %self.name, depth = chain.len())
    )]
    pub async fn dispatch(
        &self,
        agent: &Coordinator,
        request: AgentRequest,
        chain: HandlerChain,
    ) -> Option<SkillCommandResult> {
        let classifier = if self.intent_detection {
            Some(agent.classifier())
        } else {
            None
        };

        let Some(resolution) = resolve(&self.registry, &request, classifier).await else {
            tracing::debug!("Unresolved");
            return None;
        };

        tracing::debug!(
            command = %resolution.command.name(),
            resolved_by = %resolution.resolved_by,
            "Command selected"
        );
        agent.execute(&resolution.command, request, chain).await
    }

    /// Command entry for mounting this owner one level up.
    ///
    /// Returns `(name, spec, handler)`; register it with
    /// [`CommandRegistry::register_skill`].
    pub fn top_level_slash_command(
        self: &Arc<Self>,
    ) -> (String, CommandSpec, Arc<dyn SkillHandler>) {
        let mut spec = CommandSpec::skill(self.name.clone(), self.name.clone())
            .display_name(self.display_name.clone());
        spec.intent_description = self.intent_description.clone();

        let handler: Arc<dyn SkillHandler> = self.clone();
        (self.name.clone(), spec, handler)
    }
}

#[async_trait]
impl SkillHandler for OwnerComposer {
    async fn handle(&self, args: SkillCommandArgs) -> Result<SkillCommandResult, HandlerError> {
        let SkillCommandArgs {
            mut request,
            agent,
            handler_chain,
        } = args;

        // The parent consumed the explicit command that selected this owner.
        if request.command.is_some() && request.command.as_deref() == handler_chain.last() {
            request.command = None;
        }

        self.dispatch(&agent, request, handler_chain)
            .await
            .ok_or_else(|| HandlerError::Unresolved(self.name.clone()))
    }
}

impl fmt::Debug for OwnerComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerComposer")
            .field("name", &self.name)
            .field("hidden", &self.hidden)
            .field("intent_detection", &self.intent_detection)
            .field("registry", &self.registry)
            .finish()
    }
}
