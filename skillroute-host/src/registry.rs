//! Registry of connected extensions
//!
//! Discovers what each extension offers, builds an owner from its commands
//! for the router, and runs its wizards when the router selects one.

use crate::bridge::ExtensionBridge;
use crate::client::{ExtensionClient, HostError};
use async_trait::async_trait;
use skillroute::api::{
    BenchmarkConfig, CommandKind, CommandSpec, ExtensionManifest, WizardInvocation, WizardOutcome,
};
use skillroute::{AgentRequest, CommandRegistry, HandlerError, OwnerComposer, WizardRunner};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe registry of extensions, keyed by command prefix
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    dry_run: Arc<AtomicBool>,
}

#[derive(Default)]
struct RegistryInner {
    extensions: HashMap<String, ExtensionEntry>,
}

struct ExtensionEntry {
    client: ExtensionClient,
    manifest: ExtensionManifest,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather wizard inputs without executing (for benchmark runs)
    pub fn set_dry_run(&self, dry_run: bool) {
        self.dry_run.store(dry_run, Ordering::SeqCst);
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run.load(Ordering::SeqCst)
    }

    /// Connect an extension and fetch its manifest.
    ///
    /// Registering a prefix again replaces the previous entry.
    pub async fn register(
        &self,
        prefix: impl Into<String>,
        bridge: Arc<dyn ExtensionBridge>,
    ) -> Result<ExtensionManifest, HostError> {
        let client = ExtensionClient::new(prefix, bridge);
        let manifest = client.manifest().await?;
        let prefix = client.prefix().to_string();

        tracing::info!(
            extension = %prefix,
            version = %manifest.version,
            commands = manifest.commands.len(),
            "Extension registered"
        );

        let mut inner = self.inner.write().await;
        inner.extensions.insert(
            prefix,
            ExtensionEntry {
                client,
                manifest: manifest.clone(),
            },
        );
        Ok(manifest)
    }

    /// Disconnect an extension
    pub async fn unload(&self, prefix: &str) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.extensions.remove(prefix).is_some();
        if removed {
            tracing::info!(extension = %prefix, "Extension unloaded");
        }
        removed
    }

    /// Registered prefixes, sorted
    pub async fn list(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut prefixes: Vec<_> = inner.extensions.keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    pub async fn manifest(&self, prefix: &str) -> Option<ExtensionManifest> {
        let inner = self.inner.read().await;
        inner.extensions.get(prefix).map(|e| e.manifest.clone())
    }

    /// Benchmarks of every extension; failing extensions are skipped
    pub async fn benchmarks(&self) -> Vec<BenchmarkConfig> {
        let clients: Vec<ExtensionClient> = {
            let inner = self.inner.read().await;
            let mut entries: Vec<_> = inner.extensions.values().collect();
            entries.sort_by(|a, b| a.client.prefix().cmp(b.client.prefix()));
            entries.into_iter().map(|e| e.client.clone()).collect()
        };

        let mut configs = Vec::new();
        for client in clients {
            match client.benchmarks().await {
                Ok(found) => configs.extend(found),
                Err(e) => {
                    tracing::warn!(extension = %client.prefix(), error = %e, "Failed to fetch benchmarks")
                }
            }
        }
        configs
    }

    /// Owner exposing an extension's wizard and simple commands.
    ///
    /// Skill commands cannot run across the bridge and are left out.
    pub async fn owner_for(&self, prefix: &str) -> Result<OwnerComposer, HostError> {
        let manifest = self
            .manifest(prefix)
            .await
            .ok_or_else(|| HostError::UnknownExtension(prefix.to_string()))?;

        let mut registry = CommandRegistry::new();
        for spec in manifest.commands {
            if spec.kind == CommandKind::Skill {
                tracing::warn!(extension = %prefix, command = %spec.name, "Skipping skill command");
                continue;
            }
            registry.register(spec)?;
        }
        Ok(OwnerComposer::new(prefix, registry))
    }

    async fn client_for(&self, command_id: &str) -> Option<ExtensionClient> {
        let inner = self.inner.read().await;
        inner
            .extensions
            .values()
            .find(|e| e.manifest.commands.iter().any(|c| c.command_id == command_id))
            .map(|e| e.client.clone())
    }
}

#[async_trait]
impl WizardRunner for ExtensionRegistry {
    async fn run_wizard(
        &self,
        spec: &CommandSpec,
        request: &AgentRequest,
    ) -> Result<WizardOutcome, HandlerError> {
        let client = self
            .client_for(&spec.command_id)
            .await
            .ok_or_else(|| HandlerError::Failed(HostError::UnknownCommand(spec.command_id.clone()).into()))?;

        let invocation = WizardInvocation {
            command_id: spec.command_id.clone(),
            prompt: request.user_prompt.clone(),
            inputs: request
                .input_queue
                .as_ref()
                .map(|queue| queue.drain())
                .unwrap_or_default(),
            dry_run: self.is_dry_run(),
        };
        tracing::debug!(
            extension = %client.prefix(),
            command_id = %spec.command_id,
            inputs = invocation.inputs.len(),
            dry_run = invocation.dry_run,
            "Forwarding wizard"
        );

        match request
            .token
            .run_until_cancelled(client.run_wizard(&invocation))
            .await
        {
            None => Err(HandlerError::Cancelled),
            Some(result) => result.map_err(|e| HandlerError::Failed(e.into())),
        }
    }
}
