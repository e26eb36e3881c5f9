//! skillroute-sdk: answer the router's extension calls
//!
//! An extension implements [`Extension`] and hands each incoming call to an
//! [`ExtensionServer`], which takes care of the well-known command ids and
//! the MessagePack envelope.
//!
//! ## Quick Start
//!
//! ```rust
//! use skillroute_sdk::prelude::*;
//!
//! struct Storage;
//!
//! impl Extension for Storage {
//!     fn manifest(&self) -> ExtensionManifest {
//!         ExtensionManifest::new("1.2.0").command(
//!             CommandSpec::wizard("createStorage", "azureStorage.createAccount")
//!                 .display_name("Create Storage Account")
//!                 .intent("Create an Azure storage account"),
//!         )
//!     }
//!
//!     fn run_wizard(&self, invocation: WizardInvocation) -> Result<WizardOutcome, String> {
//!         Ok(WizardOutcome {
//!             executed: !invocation.dry_run,
//!             collected_inputs: invocation.inputs,
//!             ..WizardOutcome::default()
//!         })
//!     }
//! }
//!
//! let server = ExtensionServer::new("azureStorage", Storage);
//! let reply = server.handle("azureStorage.getAgentCommands", &[]);
//! assert!(!reply.is_empty());
//! ```

use serde::Serialize;

// Re-export everything from skillroute-api
pub use skillroute_api::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Extension, ExtensionServer};
    pub use skillroute_api::{
        BenchmarkConfig, BenchmarkStep, CommandKind, CommandSpec, ExtensionManifest, Followup,
        WizardInvocation, WizardOutcome, API_VERSION,
    };
}

/// What an extension exposes to the router.
pub trait Extension: Send + Sync {
    /// Commands offered to the router
    fn manifest(&self) -> ExtensionManifest;

    /// Routing benchmarks shipped with the extension
    fn benchmarks(&self) -> Vec<BenchmarkConfig> {
        Vec::new()
    }

    /// Run one of the manifest's wizard commands.
    ///
    /// With `invocation.dry_run` set, gather inputs but do not execute.
    fn run_wizard(&self, invocation: WizardInvocation) -> Result<WizardOutcome, String>;
}

/// Serves the well-known command ids for one extension.
pub struct ExtensionServer<E> {
    ids: ExtensionCommandIds,
    extension: E,
}

impl<E: Extension> ExtensionServer<E> {
    /// Serve `extension` under the command prefix `prefix`
    pub fn new(prefix: &str, extension: E) -> Self {
        Self {
            ids: ExtensionCommandIds::for_extension(prefix),
            extension,
        }
    }

    pub fn ids(&self) -> &ExtensionCommandIds {
        &self.ids
    }

    pub fn extension(&self) -> &E {
        &self.extension
    }

    /// Answer one call; the reply is always an encoded [`ExtensionReply`]
    pub fn handle(&self, command_id: &str, payload: &[u8]) -> Vec<u8> {
        if command_id == self.ids.get_commands {
            reply(ExtensionReply::success(self.extension.manifest()))
        } else if command_id == self.ids.get_benchmarks {
            reply(ExtensionReply::success(self.extension.benchmarks()))
        } else if command_id == self.ids.run_wizard_dry {
            reply(self.wizard(payload, true))
        } else if command_id == self.ids.run_wizard_with_inputs {
            reply(self.wizard(payload, false))
        } else {
            reply(ExtensionReply::<()>::user_error(format!(
                "Unknown command id: {}",
                command_id
            )))
        }
    }

    fn wizard(&self, payload: &[u8], dry_run: bool) -> ExtensionReply<WizardOutcome> {
        let mut invocation: WizardInvocation = match decode(payload) {
            Ok(invocation) => invocation,
            Err(e) => return ExtensionReply::user_error(format!("Invalid invocation: {}", e)),
        };
        invocation.dry_run = dry_run;

        let is_wizard = self.extension.manifest().commands.iter().any(|c| {
            c.command_id == invocation.command_id && c.kind == CommandKind::Wizard
        });
        if !is_wizard {
            return ExtensionReply::user_error(format!(
                "Not a wizard command: {}",
                invocation.command_id
            ));
        }

        match self.extension.run_wizard(invocation) {
            Ok(outcome) => ExtensionReply::success(outcome),
            Err(message) => ExtensionReply::system_error(message),
        }
    }
}

fn reply<T: Serialize>(reply: ExtensionReply<T>) -> Vec<u8> {
    encode(&reply).unwrap_or_default()
}
