//! Skill capability contract.

use crate::chain::HandlerChain;
use crate::coordinator::Coordinator;
use crate::error::HandlerError;
use crate::request::AgentRequest;
use crate::response::IntoSkillResult;
use async_trait::async_trait;
use skillroute_api::SkillCommandResult;
use std::future::Future;
use std::sync::Arc;

/// Payload handed to a skill handler.
pub struct SkillCommandArgs {
    pub request: AgentRequest,

    /// Coordinator to dispatch nested owners through
    pub agent: Coordinator,

    /// Chain so far, already ending with this handler's name
    pub handler_chain: HandlerChain,
}

/// A skill: accepts [`SkillCommandArgs`], returns a structured result.
///
/// Implementations must honor `args.request.token`; the coordinator also
/// stops awaiting them once it fires.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use skillroute::{HandlerError, SkillCommandArgs, SkillHandler};
/// use skillroute::api::SkillCommandResult;
///
/// struct Status;
///
/// #[async_trait]
/// impl SkillHandler for Status {
///     async fn handle(&self, args: SkillCommandArgs) -> Result<SkillCommandResult, HandlerError> {
///         Ok(SkillCommandResult::message(format!("You asked: {}", args.request.user_prompt)))
///     }
/// }
/// ```
#[async_trait]
pub trait SkillHandler: Send + Sync {
    async fn handle(&self, args: SkillCommandArgs) -> Result<SkillCommandResult, HandlerError>;
}

/// Handler backed by an async closure. Built with [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut, T, E> SkillHandler for FnHandler<F>
where
    F: Fn(SkillCommandArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: IntoSkillResult + Send + 'static,
    E: Into<HandlerError> + Send + 'static,
{
    async fn handle(&self, args: SkillCommandArgs) -> Result<SkillCommandResult, HandlerError> {
        match (self.f)(args).await {
            Ok(value) => Ok(value.into_skill_result()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Wrap an async closure as a shareable [`SkillHandler`].
///
/// ```rust
/// use skillroute::{handler_fn, HandlerError};
///
/// let greet = handler_fn(|args| async move {
///     Ok::<_, HandlerError>(format!("Hello, {}!", args.request.user_prompt))
/// });
/// # let _ = greet;
/// ```
pub fn handler_fn<F, Fut, T, E>(f: F) -> Arc<dyn SkillHandler>
where
    F: Fn(SkillCommandArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: IntoSkillResult + Send + 'static,
    E: Into<HandlerError> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
