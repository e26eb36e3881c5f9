//! Pluggable intent classification.
//!
//! The resolver hands a non-empty prompt and the described commands of an
//! owner to an [`IntentClassifier`]; the classifier owns its own confidence
//! threshold and answers with a command name or `None`.

use crate::error::ClassificationError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A command the classifier may pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentCandidate {
    pub name: String,
    pub description: String,
}

/// Maps free text to a candidate command name.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        prompt: &str,
        candidates: &[IntentCandidate],
    ) -> Result<Option<String>, ClassificationError>;
}

/// Classifier that never matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMatchClassifier;

#[async_trait]
impl IntentClassifier for NoMatchClassifier {
    async fn classify(
        &self,
        _prompt: &str,
        _candidates: &[IntentCandidate],
    ) -> Result<Option<String>, ClassificationError> {
        Ok(None)
    }
}

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "please", "can", "you", "how", "what", "want", "this", "that",
    "into", "from", "new", "some", "would", "like",
];

fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= 3)
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

/// Deterministic keyword-overlap classifier.
///
/// Scores each candidate by the share of prompt keywords found in its
/// description and picks the best score at or above `threshold`. Ties go to
/// the earlier candidate.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    threshold: f32,
}

impl KeywordClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Best candidate and its score, ignoring the threshold
    pub fn best_match<'a>(
        &self,
        prompt: &str,
        candidates: &'a [IntentCandidate],
    ) -> Option<(&'a IntentCandidate, f32)> {
        let prompt_words = keywords(prompt);
        if prompt_words.is_empty() {
            return None;
        }

        let mut best: Option<(&IntentCandidate, f32)> = None;
        for candidate in candidates {
            let description_words = keywords(&candidate.description);
            let overlap = prompt_words.intersection(&description_words).count();
            let score = overlap as f32 / prompt_words.len() as f32;
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(0.34)
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(
        &self,
        prompt: &str,
        candidates: &[IntentCandidate],
    ) -> Result<Option<String>, ClassificationError> {
        let picked = self
            .best_match(prompt, candidates)
            .filter(|(_, score)| *score > 0.0 && *score >= self.threshold)
            .map(|(candidate, _)| candidate.name.clone());
        tracing::trace!(prompt, picked = ?picked, "Keyword classification");
        Ok(picked)
    }
}

/// Classifier answering from a fixed prompt table; for tests and replays.
///
/// A prompt may be routed to several commands (one per nesting level); the
/// first one among the offered candidates is answered. Prompts listed with
/// [`ScriptedClassifier::fail_on`] produce an error.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    answers: HashMap<String, Vec<String>>,
    failures: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` for `prompt`
    pub fn route(mut self, prompt: impl Into<String>, command: impl Into<String>) -> Self {
        self.answers
            .entry(prompt.into())
            .or_default()
            .push(command.into());
        self
    }

    /// Fail when asked about `prompt`
    pub fn fail_on(mut self, prompt: impl Into<String>) -> Self {
        self.failures.insert(prompt.into());
        self
    }

    /// Number of classification requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        prompt: &str,
        candidates: &[IntentCandidate],
    ) -> Result<Option<String>, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.contains(prompt) {
            return Err(ClassificationError::Unavailable(format!(
                "scripted failure for '{}'",
                prompt
            )));
        }
        Ok(self.answers.get(prompt).and_then(|names| {
            names
                .iter()
                .find(|name| candidates.iter().any(|c| &c.name == *name))
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<IntentCandidate> {
        vec![
            IntentCandidate {
                name: "createContainerApp".into(),
                description: "Create a container app and deploy an image to it".into(),
            },
            IntentCandidate {
                name: "createFunctionApp".into(),
                description: "Create a function app for serverless code".into(),
            },
        ]
    }

    #[tokio::test]
    async fn test_keyword_classifier_picks_best_overlap() {
        let classifier = KeywordClassifier::default();
        let picked = classifier
            .classify("create a function app please", &candidates())
            .await
            .unwrap();
        assert_eq!(picked.as_deref(), Some("createFunctionApp"));
    }

    #[tokio::test]
    async fn test_keyword_classifier_respects_threshold() {
        let classifier = KeywordClassifier::new(0.9);
        let picked = classifier
            .classify("deploy my container somewhere cheap", &candidates())
            .await
            .unwrap();
        assert!(picked.is_none());
    }

    #[tokio::test]
    async fn test_keyword_classifier_no_overlap() {
        let classifier = KeywordClassifier::new(0.0);
        let picked = classifier.classify("weather today", &candidates()).await.unwrap();
        assert!(picked.is_none());
    }

    #[tokio::test]
    async fn test_scripted_classifier_only_answers_known_candidates() {
        let classifier = ScriptedClassifier::new()
            .route("make a site", "createWebApp")
            .route("make a function", "createFunctionApp")
            .fail_on("boom");

        assert!(classifier.classify("make a site", &candidates()).await.unwrap().is_none());
        assert_eq!(
            classifier
                .classify("make a function", &candidates())
                .await
                .unwrap()
                .as_deref(),
            Some("createFunctionApp")
        );
        assert!(classifier.classify("boom", &candidates()).await.is_err());
        assert_eq!(classifier.calls(), 3);
    }
}
