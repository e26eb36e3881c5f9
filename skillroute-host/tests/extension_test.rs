//! Host and SDK wired together in-process.

use skillroute::{AgentRequest, CancellationToken, InputQueue, Router};
use skillroute_host::{ExtensionRegistry, HostError, LoopbackBridge};
use skillroute_sdk::prelude::*;
use std::sync::Arc;

struct Storage;

impl Extension for Storage {
    fn manifest(&self) -> ExtensionManifest {
        ExtensionManifest::new("2.1.0")
            .command(
                CommandSpec::wizard("createStorage", "azureStorage.createAccount")
                    .display_name("Create Storage Account")
                    .intent("Create an Azure storage account"),
            )
            .command(
                CommandSpec::simple("openExplorer", "azureStorage.openExplorer")
                    .display_name("Open Storage Explorer"),
            )
            .command(CommandSpec::skill("explain", "azureStorage.explain"))
    }

    fn benchmarks(&self) -> Vec<BenchmarkConfig> {
        vec![BenchmarkConfig::new("storage").step(
            BenchmarkStep::new("/createStorage")
                .accept(["azureStorage", "createStorage"])
                .accept(["createStorage"]),
        )]
    }

    fn run_wizard(&self, invocation: WizardInvocation) -> Result<WizardOutcome, String> {
        Ok(WizardOutcome {
            executed: !invocation.dry_run,
            message: None,
            follow_up: vec![Followup::new("Upload a blob")],
            collected_inputs: invocation.inputs,
        })
    }
}

async fn connected() -> ExtensionRegistry {
    let server = ExtensionServer::new("azureStorage", Storage);
    let bridge = LoopbackBridge::new(move |id: &str, payload: &[u8]| server.handle(id, payload));

    let extensions = ExtensionRegistry::new();
    extensions
        .register("azureStorage", Arc::new(bridge))
        .await
        .unwrap();
    extensions
}

#[tokio::test]
async fn test_register_and_list() {
    let extensions = connected().await;
    assert_eq!(extensions.list().await, vec!["azureStorage".to_string()]);

    let manifest = extensions.manifest("azureStorage").await.unwrap();
    assert_eq!(manifest.version, "2.1.0");
    assert_eq!(extensions.benchmarks().await[0].name, "storage");

    assert!(extensions.unload("azureStorage").await);
    assert!(!extensions.unload("azureStorage").await);
    assert!(matches!(
        extensions.owner_for("azureStorage").await.unwrap_err(),
        HostError::UnknownExtension(_)
    ));
}

#[tokio::test]
async fn test_owner_skips_skill_commands() {
    let extensions = connected().await;
    let owner = extensions.owner_for("azureStorage").await.unwrap();

    let names: Vec<_> = owner.listed_commands().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["createStorage", "openExplorer"]);
}

#[tokio::test]
async fn test_router_runs_extension_wizard() {
    let extensions = connected().await;
    let router = Router::builder()
        .visible(extensions.owner_for("azureStorage").await.unwrap())
        .wizard_runner(Arc::new(extensions.clone()))
        .build();

    let inputs = InputQueue::new(["mystorage", "westeurope"]);
    let request = AgentRequest::from_input("/createStorage").with_inputs(inputs.clone());
    let result = router.handle_request_or_prompt(request).await.unwrap();

    assert_eq!(result.handler_chain(), ["createStorage"]);
    assert_eq!(inputs.remaining(), 0);
    assert!(result
        .chat_agent_result
        .message
        .as_deref()
        .unwrap()
        .starts_with("Finished"));

    let follow_ups = router
        .follow_up_for_last_handled_slash_command(&result.chat_agent_result, &CancellationToken::new())
        .unwrap();
    assert_eq!(follow_ups[0].prompt, "Upload a blob");
}

#[tokio::test]
async fn test_dry_run_mode() {
    let extensions = connected().await;
    extensions.set_dry_run(true);
    let router = Router::builder()
        .visible(extensions.owner_for("azureStorage").await.unwrap())
        .wizard_runner(Arc::new(extensions.clone()))
        .build();

    let result = router
        .handle_request_or_prompt(AgentRequest::new("create an azure storage account"))
        .await
        .unwrap();
    assert!(result
        .chat_agent_result
        .message
        .as_deref()
        .unwrap()
        .contains("without running it"));
}
