//! Per-turn request value.

use crate::cancel::CancellationToken;
use crate::stream::{NullStream, ResponseStream};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Who produced a turn of conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One earlier turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub command: Option<String>,
    pub text: String,
}

/// Conversation context visible to handlers.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    pub history: Vec<ChatTurn>,
}

impl ConversationContext {
    pub fn push(&mut self, turn: ChatTurn) {
        self.history.push(turn);
    }
}

/// Pre-supplied answers for wizard prompts.
///
/// Clones share the same queue, so answers consumed by a nested wizard are
/// gone for the rest of the turn.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    inputs: Arc<Mutex<VecDeque<String>>>,
}

impl InputQueue {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: Arc::new(Mutex::new(inputs.into_iter().map(Into::into).collect())),
        }
    }

    /// Take the next answer
    pub fn pop(&self) -> Option<String> {
        self.inputs.lock().unwrap().pop_front()
    }

    /// Take every remaining answer
    pub fn drain(&self) -> Vec<String> {
        self.inputs.lock().unwrap().drain(..).collect()
    }

    pub fn remaining(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

/// A prompt split into its slash command and the remaining text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashPrompt {
    pub command: Option<String>,
    pub prompt: String,
}

impl SlashPrompt {
    /// Split `"/name rest"` into `("name", "rest")`.
    ///
    /// Text without a leading slash (or a bare `/`) has no command.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or_default();
            if !name.is_empty() {
                return Self {
                    command: Some(name.to_string()),
                    prompt: parts.next().unwrap_or_default().trim().to_string(),
                };
            }
        }
        Self {
            command: None,
            prompt: trimmed.to_string(),
        }
    }
}

/// Everything a handler learns about the current turn.
///
/// Cloning is cheap: the stream, token and input queue are shared handles.
#[derive(Clone)]
pub struct AgentRequest {
    /// Explicit slash command, if the user typed one
    pub command: Option<String>,

    /// Raw prompt text (without the slash command)
    pub user_prompt: String,

    pub context: ConversationContext,

    pub stream: Arc<dyn ResponseStream>,

    pub token: CancellationToken,

    /// Answers for wizard prompts when replaying or benchmarking
    pub input_queue: Option<InputQueue>,
}

impl AgentRequest {
    /// Free-text request with a discarding stream and a fresh token
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            command: None,
            user_prompt: user_prompt.into(),
            context: ConversationContext::default(),
            stream: Arc::new(NullStream),
            token: CancellationToken::new(),
            input_queue: None,
        }
    }

    /// Request built from raw chat input such as `"/deploy my app"`
    pub fn from_input(text: &str) -> Self {
        let SlashPrompt { command, prompt } = SlashPrompt::parse(text);
        let mut request = Self::new(prompt);
        request.command = command;
        request
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_stream(mut self, stream: Arc<dyn ResponseStream>) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_inputs(mut self, inputs: InputQueue) -> Self {
        self.input_queue = Some(inputs);
        self
    }

    /// Whether the trimmed prompt is empty
    pub fn prompt_is_empty(&self) -> bool {
        self.user_prompt.trim().is_empty()
    }
}

impl fmt::Debug for AgentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRequest")
            .field("command", &self.command)
            .field("user_prompt", &self.user_prompt)
            .field("history", &self.context.history.len())
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_prompt_parse() {
        let parsed = SlashPrompt::parse("  /deploy   my web app ");
        assert_eq!(parsed.command.as_deref(), Some("deploy"));
        assert_eq!(parsed.prompt, "my web app");

        let bare = SlashPrompt::parse("/status");
        assert_eq!(bare.command.as_deref(), Some("status"));
        assert_eq!(bare.prompt, "");
    }

    #[test]
    fn test_slash_prompt_without_command() {
        assert_eq!(SlashPrompt::parse("how do I deploy?").command, None);
        assert_eq!(SlashPrompt::parse("/").command, None);
        assert_eq!(SlashPrompt::parse("/ hello").command, None);
    }

    #[test]
    fn test_input_queue_is_shared() {
        let queue = InputQueue::new(["eastus", "my-app"]);
        let clone = queue.clone();
        assert_eq!(clone.pop().as_deref(), Some("eastus"));
        assert_eq!(queue.remaining(), 1);
        assert_eq!(queue.drain(), vec!["my-app".to_string()]);
        assert!(clone.pop().is_none());
    }

    #[test]
    fn test_prompt_is_empty_trims() {
        assert!(AgentRequest::new("   ").prompt_is_empty());
        assert!(!AgentRequest::from_input("/deploy now").prompt_is_empty());
    }
}
