//! `stepwise run`: run one task and print its summary.
//!
//! Events go to stderr as they happen; the summary goes to stdout, so the
//! command composes with pipes.

use std::sync::Arc;

use anyhow::Context;
use stepwise_agent::Agent;
use stepwise_config::AppConfig;
use stepwise_core::{AgentEvent, EventKind, EventSink, SinkError};
use stepwise_tools::{Workspace, default_registry};
use tracing::warn;

pub async fn run(task: String, max_steps: Option<u32>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;
    if let Some(max_steps) = max_steps {
        config.agent.max_steps = max_steps;
        config.validate()?;
    }

    if !config.has_api_key() {
        warn!(
            provider = %config.default_provider,
            "No API key configured; set STEPWISE_API_KEY or add api_key to {}",
            AppConfig::config_dir().join("config.toml").display()
        );
    }

    let provider = stepwise_providers::build_from_config(&config).default_provider()?;
    let tools = Arc::new(default_registry(Workspace::new(config.workspace_root())));

    let agent = Agent::new(
        provider,
        &config.default_model,
        tools,
        config.agent.clone(),
    )
    .with_temperature(config.default_temperature)
    .with_max_tokens(config.default_max_tokens);

    let summary = agent.run(&task, &ConsoleSink).await?;
    println!("{summary}");

    Ok(())
}

/// Prints each event to stderr as a single line.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn accept(&self, event: AgentEvent) -> Result<(), SinkError> {
        eprintln!("{}", render(&event));
        Ok(())
    }
}

fn render(event: &AgentEvent) -> String {
    let label = event.event_type();
    match (event.kind, &event.meta) {
        (EventKind::Action, Some(tool)) => format!("  [{label}] {tool} {}", event.content),
        _ => format!("  [{label}] {}", event.content),
    }
}
