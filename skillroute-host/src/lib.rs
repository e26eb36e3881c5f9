//! skillroute-host: router side of the extension contract
//!
//! Extensions own their commands in another process (or another crate)
//! and are reached through an [`ExtensionBridge`]. The [`ExtensionRegistry`]
//! turns each one into an owner the router can mount, and runs their
//! wizards as the router's [`skillroute::WizardRunner`].
//!
//! ```rust,ignore
//! let extensions = ExtensionRegistry::new();
//! extensions.register("azureStorage", bridge).await?;
//!
//! let router = Router::builder()
//!     .visible(extensions.owner_for("azureStorage").await?)
//!     .wizard_runner(Arc::new(extensions.clone()))
//!     .build();
//! ```

pub mod bridge;
pub mod client;
pub mod registry;

pub use bridge::{BridgeError, ExtensionBridge, LoopbackBridge};
pub use client::{ExtensionClient, HostError};
pub use registry::ExtensionRegistry;
