//! Typed calls to one extension over its bridge.

use crate::bridge::{BridgeError, ExtensionBridge};
use serde::de::DeserializeOwned;
use serde::Serialize;
use skillroute::RegistryError;
use skillroute_api::{
    decode, encode, BenchmarkConfig, ExtensionCommandIds, ExtensionManifest, ExtensionReply,
    WireError, WizardInvocation, WizardOutcome, API_VERSION,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors talking to extensions.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("Extension error {code}: {message}")]
    Extension { code: u8, message: String },

    #[error("API version mismatch: expected {expected}, got {actual}")]
    ApiVersionMismatch { expected: u32, actual: u32 },

    #[error("Extension '{0}' is not registered")]
    UnknownExtension(String),

    #[error("No extension provides command '{0}'")]
    UnknownCommand(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One extension, addressed by its command prefix.
#[derive(Clone)]
pub struct ExtensionClient {
    prefix: String,
    ids: ExtensionCommandIds,
    bridge: Arc<dyn ExtensionBridge>,
}

impl ExtensionClient {
    pub fn new(prefix: impl Into<String>, bridge: Arc<dyn ExtensionBridge>) -> Self {
        let prefix = prefix.into();
        Self {
            ids: ExtensionCommandIds::for_extension(&prefix),
            prefix,
            bridge,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ids(&self) -> &ExtensionCommandIds {
        &self.ids
    }

    /// Fetch the manifest, rejecting incompatible API versions
    pub async fn manifest(&self) -> Result<ExtensionManifest, HostError> {
        let manifest: ExtensionManifest = self.call(&self.ids.get_commands, &()).await?;
        if manifest.api_version != API_VERSION {
            return Err(HostError::ApiVersionMismatch {
                expected: API_VERSION,
                actual: manifest.api_version,
            });
        }
        Ok(manifest)
    }

    pub async fn benchmarks(&self) -> Result<Vec<BenchmarkConfig>, HostError> {
        self.call(&self.ids.get_benchmarks, &()).await
    }

    /// Run a wizard; `invocation.dry_run` picks the command id
    pub async fn run_wizard(&self, invocation: &WizardInvocation) -> Result<WizardOutcome, HostError> {
        let command_id = if invocation.dry_run {
            &self.ids.run_wizard_dry
        } else {
            &self.ids.run_wizard_with_inputs
        };
        self.call(command_id, invocation).await
    }

    async fn call<Req, Resp>(&self, command_id: &str, request: &Req) -> Result<Resp, HostError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = encode(request)?;
        tracing::trace!(extension = %self.prefix, command_id, bytes = payload.len(), "Invoking extension");

        let reply = self.bridge.invoke(command_id, payload).await?;
        let reply: ExtensionReply<Resp> = decode(&reply)?;
        reply
            .into_result()
            .map_err(|e| HostError::Extension {
                code: e.code,
                message: e.message,
            })
    }
}

impl fmt::Debug for ExtensionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionClient")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
