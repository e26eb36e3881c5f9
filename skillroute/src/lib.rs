//! # skillroute: slash-command routing for IDE chat assistants
//!
//! Skills are grouped into owners, owners are tried by a [`Router`] in
//! priority order, and within an owner a request is resolved strictly as
//! explicit command, then no-input fallback, then intent classification,
//! then default fallback.
//!
//! ## Core Principles
//!
//! - **One entry point**: a [`Router`] built once, no globals
//! - **Nesting by value**: owners mount into parent registries and the
//!   [`HandlerChain`] grows by one name per level
//! - **Failures stay quiet**: handler errors and cancellation look exactly
//!   like a request nothing matched
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use skillroute::api::{CommandSpec, Followup};
//! use skillroute::{handler_fn, AgentRequest, CommandRegistry, HandlerError, OwnerComposer, Router};
//!
//! let mut registry = CommandRegistry::new();
//! registry.register_skill(
//!     CommandSpec::skill("deploy", "azure.deploy").intent("Deploy an app to Azure"),
//!     handler_fn(|args| async move {
//!         Ok::<_, HandlerError>((
//!             format!("Deploying {}", args.request.user_prompt),
//!             vec![Followup::new("Show deployment logs")],
//!         ))
//!     }),
//! )?;
//!
//! let router = Router::builder()
//!     .diagnostic(skillroute::diagnostics::diagnostics_owner()?)
//!     .visible(OwnerComposer::new("azure", registry))
//!     .build();
//!
//! let result = router
//!     .handle_request_or_prompt(AgentRequest::from_input("/deploy my web app"))
//!     .await;
//! ```

pub use skillroute_api as api;

pub mod actions;
pub mod audit;
pub mod benchmark;
pub mod cancel;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod handler;
pub mod owner;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod response;
pub mod router;
pub mod stream;

// Optional modules
pub mod build_info;
pub mod tracing_support;

// Re-export tracing itself (required for #[instrument] macro)
#[cfg(feature = "tracing")]
pub use tracing_support::tracing;

#[cfg(feature = "tracing")]
pub use tracing_support::{init_subscriber, init_subscriber_with_config, TracingConfig, TracingFormat};

pub use build_info::{version_info, version_short};

pub use actions::{IdeCommands, NullIdeCommands, RecordingIdeCommands, WizardRunner};
pub use audit::{AuditSink, DispatchEvent, DispatchOutcome, FileAuditSink, MemoryAuditSink};
pub use benchmark::{run_benchmark, BenchmarkReport, StepReport};
pub use cancel::CancellationToken;
pub use chain::HandlerChain;
pub use classifier::{IntentCandidate, IntentClassifier, KeywordClassifier, ScriptedClassifier};
pub use config::RouterConfig;
pub use coordinator::Coordinator;
pub use environment::{EnvironmentSnapshot, HostEnvironment, StaticEnvironment};
pub use error::{ClassificationError, ConfigError, HandlerError, RegistryError};
pub use handler::{handler_fn, SkillCommandArgs, SkillHandler};
pub use owner::OwnerComposer;
pub use registry::{CommandRegistry, Fallback, RegisteredCommand};
pub use request::{AgentRequest, InputQueue, SlashPrompt};
pub use resolver::{resolve, ResolvedBy};
pub use response::IntoSkillResult;
pub use router::{OwnerTier, Router, RouterBuilder};
pub use stream::{NullStream, RecordingStream, ResponseStream};
