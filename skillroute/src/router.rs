//! Top-level router: the single entry point for chat turns.
//!
//! Owners are tried strictly in tier order (diagnostic, then benchmark, then
//! user-visible) and the first one to produce a result wins.

use crate::actions::{IdeCommands, WizardRunner};
use crate::audit::{AuditSink, DispatchEvent, DispatchOutcome, NullAuditSink};
use crate::cancel::CancellationToken;
use crate::chain::HandlerChain;
use crate::classifier::{IntentClassifier, KeywordClassifier};
use crate::config::RouterConfig;
use crate::coordinator::Coordinator;
use crate::environment::HostEnvironment;
use crate::owner::OwnerComposer;
use crate::request::AgentRequest;
use skillroute_api::{ChatAgentResult, Followup, SkillCommandResult};
use std::fmt;
use std::sync::Arc;

/// Dispatch priority of an owner. Lower tiers are tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OwnerTier {
    /// Internal commands; never listed
    Diagnostic,
    /// Benchmark tooling; never listed
    Benchmark,
    UserVisible,
}

impl OwnerTier {
    pub fn is_listed(&self) -> bool {
        matches!(self, OwnerTier::UserVisible)
    }
}

/// Routes chat turns to owners. Built once with [`Router::builder`].
pub struct Router {
    owners: Vec<(OwnerTier, Arc<OwnerComposer>)>,
    agent: Coordinator,
    config: RouterConfig,
    audit: Arc<dyn AuditSink>,
}

/// Builder for [`Router`].
///
/// Without an explicit classifier the router uses a [`KeywordClassifier`]
/// with the configured threshold.
#[derive(Default)]
pub struct RouterBuilder {
    owners: Vec<(OwnerTier, Arc<OwnerComposer>)>,
    config: RouterConfig,
    classifier: Option<Arc<dyn IntentClassifier>>,
    environment: Option<Arc<dyn HostEnvironment>>,
    ide: Option<Arc<dyn IdeCommands>>,
    wizards: Option<Arc<dyn WizardRunner>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl RouterBuilder {
    pub fn owner(mut self, tier: OwnerTier, owner: impl Into<Arc<OwnerComposer>>) -> Self {
        self.owners.push((tier, owner.into()));
        self
    }

    pub fn diagnostic(self, owner: impl Into<Arc<OwnerComposer>>) -> Self {
        self.owner(OwnerTier::Diagnostic, owner)
    }

    pub fn benchmark(self, owner: impl Into<Arc<OwnerComposer>>) -> Self {
        self.owner(OwnerTier::Benchmark, owner)
    }

    pub fn visible(self, owner: impl Into<Arc<OwnerComposer>>) -> Self {
        self.owner(OwnerTier::UserVisible, owner)
    }

    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn ide_commands(mut self, ide: Arc<dyn IdeCommands>) -> Self {
        self.ide = Some(ide);
        self
    }

    pub fn wizard_runner(mut self, wizards: Arc<dyn WizardRunner>) -> Self {
        self.wizards = Some(wizards);
        self
    }

    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn build(self) -> Router {
        let RouterBuilder {
            mut owners,
            config,
            classifier,
            environment,
            ide,
            wizards,
            audit,
        } = self;

        // Stable: registration order is kept within a tier.
        owners.sort_by_key(|(tier, _)| *tier);

        let classifier = classifier
            .unwrap_or_else(|| Arc::new(KeywordClassifier::new(config.intent_threshold)));
        let mut agent = Coordinator::builder()
            .classifier(classifier)
            .follow_up_cache_capacity(config.follow_up_cache_capacity);
        if let Some(environment) = environment {
            agent = agent.environment(environment);
        }
        if let Some(ide) = ide {
            agent = agent.ide_commands(ide);
        }
        if let Some(wizards) = wizards {
            agent = agent.wizard_runner(wizards);
        }

        tracing::info!(
            owners = owners.len(),
            max_follow_ups = config.max_follow_ups,
            "Router built"
        );

        Router {
            owners,
            agent: agent.build(),
            config,
            audit: audit.unwrap_or_else(|| Arc::new(NullAuditSink)),
        }
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    pub fn agent(&self) -> &Coordinator {
        &self.agent
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Owners in dispatch order
    pub fn owners(&self) -> impl Iterator<Item = (OwnerTier, &OwnerComposer)> {
        self.owners.iter().map(|(tier, owner)| (*tier, owner.as_ref()))
    }

    /// Handle one chat turn.
    ///
    /// Writes the processing message first, then offers the request to each
    /// owner in order. `None` means no owner claimed the turn, including when
    /// it was cancelled.
    #[tracing::instrument(
        name = "router.handle",
        skip_all,
        fields(command = ?request.command)
    )]
    pub async fn handle_request_or_prompt(
        &self,
        request: AgentRequest,
    ) -> Option<SkillCommandResult> {
        request.stream.progress(&self.config.processing_message);

        for (tier, owner) in &self.owners {
            if request.token.is_cancelled() {
                break;
            }

            let claimed = owner
                .dispatch(&self.agent, request.clone(), HandlerChain::new())
                .await;
            if let Some(mut result) = claimed {
                tracing::debug!(owner = %owner.name(), ?tier, chain = ?result.handler_chain(), "Claimed");
                self.trim_follow_ups(&mut result.follow_up);
                self.record(&request, DispatchOutcome::Claimed, Some(&result)).await;
                return Some(result);
            }
        }

        let outcome = if request.token.is_cancelled() {
            DispatchOutcome::Cancelled
        } else {
            DispatchOutcome::Unclaimed
        };
        tracing::debug!(?outcome, "No owner claimed the request");
        self.record(&request, outcome, None).await;
        None
    }

    /// `(name, display_name)` of every command of listed owners
    pub fn list_commands(&self) -> Vec<(String, String)> {
        self.owners
            .iter()
            .filter(|(tier, _)| tier.is_listed())
            .flat_map(|(_, owner)| owner.listed_commands())
            .collect()
    }

    /// Follow-ups recorded for an earlier result, trimmed like the result was.
    ///
    /// `None` when the token is already cancelled or the result id is unknown.
    pub fn follow_up_for_last_handled_slash_command(
        &self,
        result: &ChatAgentResult,
        token: &CancellationToken,
    ) -> Option<Vec<Followup>> {
        if token.is_cancelled() {
            return None;
        }
        let mut follow_ups = self.agent.follow_up_for(result);
        self.trim_follow_ups(&mut follow_ups);
        follow_ups
    }

    fn trim_follow_ups(&self, follow_ups: &mut Option<Vec<Followup>>) {
        if let Some(list) = follow_ups {
            list.truncate(self.config.max_follow_ups);
        }
    }

    async fn record(
        &self,
        request: &AgentRequest,
        outcome: DispatchOutcome,
        result: Option<&SkillCommandResult>,
    ) {
        let mut event = DispatchEvent::new(
            request.command.clone(),
            request.user_prompt.clone(),
            outcome,
        );
        if let Some(result) = result {
            event.handler_chain = result.handler_chain().to_vec();
            event.result_id = Some(result.result_id().to_string());
            event.follow_ups = result.follow_up_count();
        }

        if let Err(e) = self.audit.record(event).await {
            tracing::warn!(error = %e, "Failed to record dispatch event");
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field(
                "owners",
                &self
                    .owners
                    .iter()
                    .map(|(tier, owner)| (tier, owner.name()))
                    .collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
