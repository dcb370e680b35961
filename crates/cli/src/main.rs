//! Stepwise CLI: the main entry point.
//!
//! Commands:
//! - `run`     : Run one task to completion in the current workspace
//! - `gateway` : Start the HTTP/SSE gateway
//! - `init`    : Write a starter config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "stepwise",
    about = "Stepwise: a reason-then-act agent runtime",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task and print the step summary
    Run {
        /// The task to hand to the agent
        #[arg(short, long)]
        task: String,

        /// Override the configured step budget
        #[arg(long)]
        max_steps: Option<u32>,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write the default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { task, max_steps } => commands::run::run(task, max_steps).await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Init => commands::init::run()?,
    }

    Ok(())
}
