//! `stepwise gateway`: Start the HTTP/SSE server.

use anyhow::Context;
use stepwise_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    eprintln!("Stepwise Gateway");
    eprintln!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    eprintln!("   Workspace: {}", config.workspace_root().display());
    eprintln!("   Run budget: {}s", config.gateway.run_timeout_secs);

    stepwise_gateway::start(config).await
}
