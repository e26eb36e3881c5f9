//! Replay of routing benchmarks.
//!
//! A benchmark is a scripted conversation. Each step is dispatched through
//! the router like a real turn, and the outcome is checked against the
//! handler chains, follow-ups and buttons the step accepts.

use crate::cancel::CancellationToken;
use crate::error::{HandlerError, RegistryError};
use crate::handler::handler_fn;
use crate::owner::OwnerComposer;
use crate::registry::{CommandRegistry, Fallback};
use crate::request::{AgentRequest, ChatTurn, ConversationContext, SlashPrompt, TurnRole};
use crate::router::Router;
use crate::stream::RecordingStream;
use serde::Serialize;
use skillroute_api::{BenchmarkConfig, BenchmarkStep, ButtonSpec, CommandSpec, Followup};
use std::sync::Arc;

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub prompt: String,
    /// Chain that handled the step; empty when nothing claimed it
    pub handler_chain: Vec<String>,
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Outcome of a whole benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkReport {
    pub name: String,
    pub steps: Vec<StepReport>,
    /// Set when the token fired before every step ran
    pub cancelled: bool,
}

impl BenchmarkReport {
    pub fn passed(&self) -> bool {
        !self.cancelled && self.steps.iter().all(|s| s.passed)
    }

    pub fn passed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.passed).count()
    }
}

/// Run every step of `config` through `router`, in order.
///
/// Steps share one conversation history. Stops early, marking the report
/// cancelled, once `token` fires.
#[tracing::instrument(name = "benchmark.run", skip_all, fields(benchmark = %config.name))]
pub async fn run_benchmark(
    router: &Router,
    config: &BenchmarkConfig,
    token: &CancellationToken,
) -> BenchmarkReport {
    let mut context = ConversationContext::default();
    let mut steps = Vec::with_capacity(config.steps.len());
    let mut cancelled = false;

    for step in &config.steps {
        if token.is_cancelled() {
            cancelled = true;
            break;
        }

        let SlashPrompt { command, prompt } = SlashPrompt::parse(&step.prompt);
        let stream = Arc::new(RecordingStream::new());
        let mut request = AgentRequest::new(prompt)
            .with_stream(stream.clone())
            .with_token(token.clone())
            .with_context(context.clone());
        request.command = command.clone();

        let result = router.handle_request_or_prompt(request).await;

        let (chain, follow_ups, message) = match &result {
            Some(result) => (
                result.handler_chain().to_vec(),
                result.follow_up.clone().unwrap_or_default(),
                result.chat_agent_result.message.clone(),
            ),
            None => (Vec::new(), Vec::new(), None),
        };
        let failures = check_step(step, result.is_some(), &chain, &follow_ups, &stream.buttons());
        if !failures.is_empty() {
            tracing::info!(prompt = %step.prompt, ?failures, "Benchmark step failed");
        }

        context.push(ChatTurn {
            role: TurnRole::User,
            command,
            text: step.prompt.clone(),
        });
        if let Some(text) = message {
            context.push(ChatTurn {
                role: TurnRole::Assistant,
                command: None,
                text,
            });
        }

        steps.push(StepReport {
            prompt: step.prompt.clone(),
            handler_chain: chain,
            passed: failures.is_empty(),
            failures,
        });
    }

    let report = BenchmarkReport {
        name: config.name.clone(),
        steps,
        cancelled,
    };
    tracing::info!(
        passed = report.passed_steps(),
        total = config.steps.len(),
        cancelled,
        "Benchmark finished"
    );
    report
}

fn check_step(
    step: &BenchmarkStep,
    claimed: bool,
    chain: &[String],
    follow_ups: &[Followup],
    buttons: &[ButtonSpec],
) -> Vec<String> {
    let mut failures = Vec::new();

    if !claimed {
        failures.push("No owner handled the prompt".to_string());
    } else if !step.acceptable_handler_chains.is_empty() && !step.accepts_chain(chain) {
        failures.push(format!(
            "Handler chain [{}] is not one of the acceptable chains",
            chain.join(" > ")
        ));
    }

    if let Some(expected) = &step.follow_ups {
        for required in &expected.required {
            if !follow_ups.iter().any(|f| follow_up_matches(required, f)) {
                failures.push(format!("Missing follow-up '{}'", required.prompt));
            }
        }
    }

    if let Some(expected) = &step.buttons {
        for required in &expected.required {
            let found = buttons
                .iter()
                .any(|b| b.title == required.title && b.command_id == required.command_id);
            if !found {
                failures.push(format!("Missing button '{}'", required.title));
            }
        }
    }

    failures
}

/// Prompts must match; the command only when the expectation names one
fn follow_up_matches(expected: &Followup, actual: &Followup) -> bool {
    expected.prompt == actual.prompt
        && (expected.command.is_none() || expected.command == actual.command)
}

/// Owner answering `/benchmarks` with the names of the loaded benchmarks.
///
/// Meant for the benchmark tier; intent detection is off so it only answers
/// when addressed explicitly.
pub fn benchmark_owner(configs: Vec<BenchmarkConfig>) -> Result<OwnerComposer, RegistryError> {
    let configs = Arc::new(configs);
    let mut registry = CommandRegistry::new();
    registry.register_skill(
        CommandSpec::skill("benchmarks", "skillroute.listBenchmarks")
            .display_name("List Benchmarks"),
        handler_fn(move |_args| {
            let configs = Arc::clone(&configs);
            async move {
                if configs.is_empty() {
                    return Ok::<_, HandlerError>("No benchmarks are loaded.".to_string());
                }
                let lines: Vec<String> = configs
                    .iter()
                    .map(|c| format!("- **{}** ({} steps)", c.name, c.steps.len()))
                    .collect();
                Ok(lines.join("\n"))
            }
        }),
    )?;

    Ok(OwnerComposer::new("benchmark", registry)
        .display_name("Benchmarks")
        .hidden()
        .without_intent_detection())
}
