//! Execution of resolved commands.
//!
//! The [`Coordinator`] is the "agent" handed to skills: it runs the selected
//! command with the turn's cancellation token, extends the handler chain and
//! stamps every result with the chain and a fresh result id. Follow-ups are
//! remembered only for the outermost result of a turn, whose id is the one
//! the caller sees.

use crate::actions::{IdeCommands, NullIdeCommands, UnsupportedWizardRunner, WizardRunner};
use crate::chain::HandlerChain;
use crate::classifier::{IntentClassifier, NoMatchClassifier};
use crate::environment::{HostEnvironment, StaticEnvironment};
use crate::error::HandlerError;
use crate::handler::SkillCommandArgs;
use crate::registry::RegisteredCommand;
use crate::request::AgentRequest;
use skillroute_api::{ChatAgentResult, CommandKind, Followup, SkillCommandResult, WizardOutcome};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Default number of results whose follow-ups are remembered.
pub const DEFAULT_FOLLOW_UP_CACHE_CAPACITY: usize = 64;

/// Most-recent follow-ups keyed by result id.
///
/// Entries are independent; the oldest is evicted once `capacity` is reached.
#[derive(Debug)]
pub struct FollowUpCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    order: VecDeque<String>,
    entries: HashMap<String, Option<Vec<Followup>>>,
}

impl FollowUpCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn insert(&self, result_id: String, follow_ups: Option<Vec<Followup>>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.contains_key(&result_id) {
            inner.entries.insert(result_id, follow_ups);
            return;
        }

        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(result_id.clone());
        inner.entries.insert(result_id, follow_ups);
    }

    /// Follow-ups recorded for `result_id`; `None` when unknown or absent
    pub fn get(&self, result_id: &str) -> Option<Vec<Followup>> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .get(result_id)
            .cloned()
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CoordinatorInner {
    classifier: Arc<dyn IntentClassifier>,
    environment: Arc<dyn HostEnvironment>,
    ide: Arc<dyn IdeCommands>,
    wizards: Arc<dyn WizardRunner>,
    follow_ups: FollowUpCache,
}

/// Runs commands and keeps the follow-up cache. Cheap to clone.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

/// Builder for [`Coordinator`]; unset collaborators get inert defaults.
pub struct CoordinatorBuilder {
    classifier: Arc<dyn IntentClassifier>,
    environment: Arc<dyn HostEnvironment>,
    ide: Arc<dyn IdeCommands>,
    wizards: Arc<dyn WizardRunner>,
    cache_capacity: usize,
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self {
            classifier: Arc::new(NoMatchClassifier),
            environment: Arc::new(StaticEnvironment::default()),
            ide: Arc::new(NullIdeCommands),
            wizards: Arc::new(UnsupportedWizardRunner),
            cache_capacity: DEFAULT_FOLLOW_UP_CACHE_CAPACITY,
        }
    }
}

impl CoordinatorBuilder {
    pub fn classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn ide_commands(mut self, ide: Arc<dyn IdeCommands>) -> Self {
        self.ide = ide;
        self
    }

    pub fn wizard_runner(mut self, wizards: Arc<dyn WizardRunner>) -> Self {
        self.wizards = wizards;
        self
    }

    pub fn follow_up_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> Coordinator {
        Coordinator {
            inner: Arc::new(CoordinatorInner {
                classifier: self.classifier,
                environment: self.environment,
                ide: self.ide,
                wizards: self.wizards,
                follow_ups: FollowUpCache::new(self.cache_capacity),
            }),
        }
    }
}

impl Coordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    pub fn classifier(&self) -> &dyn IntentClassifier {
        self.inner.classifier.as_ref()
    }

    pub fn follow_up_cache(&self) -> &FollowUpCache {
        &self.inner.follow_ups
    }

    /// Follow-ups recorded for the result id carried by `result`
    pub fn follow_up_for(&self, result: &ChatAgentResult) -> Option<Vec<Followup>> {
        self.inner.follow_ups.get(&result.metadata.result_id)
    }

    /// Run `command` for `request` below `chain`.
    ///
    /// An empty `chain` marks the outermost level of a turn. Gating violations
    /// produce an explanatory result. Handler failures and cancellation are
    /// logged and reported as `None`, exactly like a request nothing matched.
    pub async fn execute(
        &self,
        command: &RegisteredCommand,
        request: AgentRequest,
        chain: HandlerChain,
    ) -> Option<SkillCommandResult> {
        let outermost = chain.is_empty();
        let spec = command.spec();
        let chain = chain.with(spec.name.clone());

        if let Err(violation) = self.inner.environment.snapshot().check(spec) {
            tracing::info!(command = %spec.name, ?violation, "Command gated");
            let result = SkillCommandResult::message(violation.message(spec));
            return Some(self.finish(result, chain, outermost));
        }

        let token = request.token.clone();
        let outcome = token
            .run_until_cancelled(self.invoke(command, request, chain.clone()))
            .await;

        match outcome {
            None | Some(Err(HandlerError::Cancelled)) => {
                tracing::info!(command = %spec.name, "Cancelled while running");
                None
            }
            Some(Err(HandlerError::Unresolved(owner))) => {
                tracing::debug!(command = %spec.name, %owner, "Nested owner unresolved");
                None
            }
            Some(Err(e)) => {
                tracing::error!(command = %spec.name, error = %e, "Handler failed");
                None
            }
            Some(Ok(result)) => {
                let chain = chain.splice(result.handler_chain());
                Some(self.finish(result, chain, outermost))
            }
        }
    }

    async fn invoke(
        &self,
        command: &RegisteredCommand,
        request: AgentRequest,
        chain: HandlerChain,
    ) -> Result<SkillCommandResult, HandlerError> {
        let spec = command.spec();
        match spec.kind {
            CommandKind::Simple => {
                self.inner.ide.execute_command(&spec.command_id);
                Ok(SkillCommandResult::message(format!(
                    "Running **{}**.",
                    spec.display_name
                )))
            }
            CommandKind::Wizard => {
                let outcome = self.inner.wizards.run_wizard(spec, &request).await?;
                Ok(wizard_result(&spec.display_name, outcome))
            }
            CommandKind::Skill => {
                let handler = command.handler().ok_or_else(|| {
                    HandlerError::message(format!("No handler attached to '{}'", spec.name))
                })?;
                handler
                    .handle(SkillCommandArgs {
                        request,
                        agent: self.clone(),
                        handler_chain: chain,
                    })
                    .await
            }
        }
    }

    /// Stamp `result`; nested results go back to a parent that restamps
    /// them, so only the outermost one is cached.
    fn finish(
        &self,
        mut result: SkillCommandResult,
        chain: HandlerChain,
        outermost: bool,
    ) -> SkillCommandResult {
        let result_id = Uuid::new_v4().to_string();
        let metadata = &mut result.chat_agent_result.metadata;
        metadata.handler_chain = chain.into_vec();
        metadata.result_id = result_id.clone();

        if outermost {
            self.inner
                .follow_ups
                .insert(result_id, result.follow_up.clone());
        }
        result
    }
}

fn wizard_result(display_name: &str, outcome: WizardOutcome) -> SkillCommandResult {
    let message = outcome.message.unwrap_or_else(|| {
        if outcome.executed {
            format!("Finished **{}**.", display_name)
        } else {
            format!("Collected the inputs for **{}** without running it.", display_name)
        }
    });

    let mut result = SkillCommandResult::message(message);
    if !outcome.follow_up.is_empty() {
        result.follow_up = Some(outcome.follow_up);
    }
    if !outcome.collected_inputs.is_empty() {
        result = result.with_extension(
            "wizardInputs",
            serde_json::Value::from(outcome.collected_inputs),
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_evicts_oldest() {
        let cache = FollowUpCache::new(2);
        cache.insert("a".into(), Some(vec![Followup::new("one")]));
        cache.insert("b".into(), None);
        cache.insert("c".into(), Some(vec![Followup::new("three")]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("c").unwrap()[0].prompt, "three");
    }

    #[test]
    fn test_cache_unknown_id() {
        let cache = FollowUpCache::new(4);
        assert!(cache.get("missing").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_wizard_result_records_inputs() {
        let outcome = WizardOutcome {
            executed: false,
            message: None,
            follow_up: vec![Followup::new("run it")],
            collected_inputs: vec!["eastus".into()],
        };

        let result = wizard_result("Create Storage Account", outcome);
        let message = result.chat_agent_result.message.as_deref().unwrap();
        assert!(message.contains("without running it"));
        assert_eq!(result.follow_up_count(), 1);
        assert_eq!(
            result.chat_agent_result.metadata.extensions["wizardInputs"],
            serde_json::json!(["eastus"])
        );
    }
}
