//! Dispatch resolution: which command of a registry handles a request.
//!
//! Rules are tried strictly in order and the first applicable one wins:
//!
//! 1. explicit command present in the registry
//! 2. `no_input` fallback for an empty prompt without a command
//! 3. intent classification of a non-empty prompt
//! 4. `default` fallback
//!
//! Nothing applicable means unresolved (`None`), and the caller moves on to
//! the next owner.

use crate::classifier::IntentClassifier;
use crate::registry::{CommandRegistry, RegisteredCommand};
use crate::request::AgentRequest;
use std::fmt;
use std::sync::Arc;

/// Rule that selected a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Explicit,
    NoInput,
    Intent,
    Default,
}

impl fmt::Display for ResolvedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResolvedBy::Explicit => "explicit",
            ResolvedBy::NoInput => "no_input",
            ResolvedBy::Intent => "intent",
            ResolvedBy::Default => "default",
        };
        f.write_str(label)
    }
}

/// A committed selection.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub command: Arc<RegisteredCommand>,
    pub resolved_by: ResolvedBy,
}

impl Resolution {
    fn new(command: &Arc<RegisteredCommand>, resolved_by: ResolvedBy) -> Self {
        Self {
            command: Arc::clone(command),
            resolved_by,
        }
    }
}

/// Pick the command of `registry` that should handle `request`.
///
/// `classifier` is `None` when intent detection is disabled for the owner.
/// A failing classifier counts as no match; cancellation while classifying
/// makes the request unresolved.
pub async fn resolve(
    registry: &CommandRegistry,
    request: &AgentRequest,
    classifier: Option<&dyn IntentClassifier>,
) -> Option<Resolution> {
    if let Some(name) = request.command.as_deref() {
        if let Some(command) = registry.get(name) {
            return Some(Resolution::new(command, ResolvedBy::Explicit));
        }
    }

    let empty_prompt = request.prompt_is_empty();

    if request.command.is_none() && empty_prompt {
        if let Some(command) = registry.no_input_command() {
            return Some(Resolution::new(command, ResolvedBy::NoInput));
        }
    }

    if let (Some(classifier), false) = (classifier, empty_prompt) {
        let candidates = registry.intent_candidates();
        if !candidates.is_empty() {
            let prompt = request.user_prompt.trim();
            let classified = request
                .token
                .run_until_cancelled(classifier.classify(prompt, &candidates))
                .await?;

            match classified {
                Ok(Some(name)) => match registry.get(&name) {
                    Some(command) => return Some(Resolution::new(command, ResolvedBy::Intent)),
                    None => {
                        tracing::warn!(command = %name, "Classifier picked an unknown command")
                    }
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Intent classification failed"),
            }
        }
    }

    registry
        .default_command()
        .map(|command| Resolution::new(command, ResolvedBy::Default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{NoMatchClassifier, ScriptedClassifier};
    use crate::handler::{handler_fn, SkillHandler};
    use crate::registry::Fallback;
    use crate::HandlerError;
    use skillroute_api::CommandSpec;

    fn noop() -> Arc<dyn SkillHandler> {
        handler_fn(|_args| async { Ok::<_, HandlerError>(()) })
    }

    /// `{commands: [A, B], default: A, noInput: B}`
    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register_skill(CommandSpec::skill("A", "a").intent("alpha things"), noop())
            .unwrap();
        registry
            .register_skill(CommandSpec::skill("B", "b").intent("beta things"), noop())
            .unwrap();
        registry.set_default(Fallback::command("A")).unwrap();
        registry.set_no_input(Fallback::command("B")).unwrap();
        registry
    }

    async fn pick(
        registry: &CommandRegistry,
        request: AgentRequest,
        classifier: Option<&dyn IntentClassifier>,
    ) -> Option<(String, ResolvedBy)> {
        resolve(registry, &request, classifier)
            .await
            .map(|r| (r.command.name().to_string(), r.resolved_by))
    }

    #[tokio::test]
    async fn test_empty_prompt_selects_no_input() {
        let picked = pick(&registry(), AgentRequest::new(""), Some(&NoMatchClassifier)).await;
        assert_eq!(picked, Some(("B".into(), ResolvedBy::NoInput)));
    }

    #[tokio::test]
    async fn test_unmatched_text_without_classification_selects_default() {
        let picked = pick(&registry(), AgentRequest::new("some unmatched text"), None).await;
        assert_eq!(picked, Some(("A".into(), ResolvedBy::Default)));
    }

    #[tokio::test]
    async fn test_explicit_command_ignores_prompt_and_classifier() {
        let classifier = ScriptedClassifier::new().route("irrelevant", "A");
        let request = AgentRequest::new("irrelevant").command("B");
        let picked = pick(&registry(), request, Some(&classifier)).await;
        assert_eq!(picked, Some(("B".into(), ResolvedBy::Explicit)));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_classification_beats_default() {
        let classifier = ScriptedClassifier::new().route("beta please", "B");
        let picked = pick(&registry(), AgentRequest::new("beta please"), Some(&classifier)).await;
        assert_eq!(picked, Some(("B".into(), ResolvedBy::Intent)));
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back_to_default() {
        let classifier = ScriptedClassifier::new().fail_on("anything");
        let picked = pick(&registry(), AgentRequest::new("anything"), Some(&classifier)).await;
        assert_eq!(picked, Some(("A".into(), ResolvedBy::Default)));
    }

    #[tokio::test]
    async fn test_empty_prompt_is_never_classified() {
        let mut registry = CommandRegistry::new();
        registry
            .register_skill(CommandSpec::skill("A", "a").intent("alpha"), noop())
            .unwrap();
        let classifier = ScriptedClassifier::new().route("", "A");

        let picked = pick(&registry, AgentRequest::new("   "), Some(&classifier)).await;
        assert_eq!(picked, None);
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_explicit_command_is_unresolved_without_fallbacks() {
        let mut registry = CommandRegistry::new();
        registry.register_skill(CommandSpec::skill("A", "a"), noop()).unwrap();

        let picked = pick(&registry, AgentRequest::new("").command("Z"), None).await;
        assert_eq!(picked, None);
    }

    #[tokio::test]
    async fn test_cancelled_classification_is_unresolved() {
        let classifier = ScriptedClassifier::new().route("beta please", "B");
        let request = AgentRequest::new("beta please");
        request.token.cancel();

        let picked = pick(&registry(), request, Some(&classifier)).await;
        assert_eq!(picked, None);
    }
}
