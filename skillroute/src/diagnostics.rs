//! Built-in diagnostic commands.
//!
//! Registered in the diagnostic tier so they are tried before anything
//! else, but they never show up in command listings.

use crate::build_info;
use crate::error::{HandlerError, RegistryError};
use crate::handler::handler_fn;
use crate::owner::OwnerComposer;
use crate::registry::CommandRegistry;
use skillroute_api::{CommandSpec, API_VERSION};

/// Owner with `/version` and `/ping`.
pub fn diagnostics_owner() -> Result<OwnerComposer, RegistryError> {
    let mut registry = CommandRegistry::new();

    registry.register_skill(
        CommandSpec::skill("version", "skillroute.version").display_name("Version"),
        handler_fn(|_args| async {
            Ok::<_, HandlerError>(format!(
                "```text\n{}\nExtension API: v{}\n```",
                build_info::version_info(),
                API_VERSION
            ))
        }),
    )?;

    registry.register_skill(
        CommandSpec::skill("ping", "skillroute.ping").display_name("Ping"),
        handler_fn(|args| async move {
            let chain = args.handler_chain.to_string();
            Ok::<_, HandlerError>(format!("pong ({})", chain))
        }),
    )?;

    Ok(OwnerComposer::new("diagnostics", registry)
        .display_name("Diagnostics")
        .hidden()
        .without_intent_detection())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::HandlerChain;
    use crate::coordinator::Coordinator;
    use crate::request::AgentRequest;

    #[tokio::test]
    async fn test_ping_answers_with_chain() {
        let owner = diagnostics_owner().unwrap();
        let agent = Coordinator::builder().build();

        let result = owner
            .dispatch(&agent, AgentRequest::from_input("/ping"), HandlerChain::new())
            .await
            .unwrap();
        assert_eq!(result.chat_agent_result.message.as_deref(), Some("pong (ping)"));
    }

    #[tokio::test]
    async fn test_free_text_is_not_claimed() {
        let owner = diagnostics_owner().unwrap();
        let agent = Coordinator::builder().build();

        let result = owner
            .dispatch(&agent, AgentRequest::new("what version is this"), HandlerChain::new())
            .await;
        assert!(result.is_none());
        assert!(owner.listed_commands().is_empty());
    }
}
