use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use watchdeck_cli::config::AppConfig;
use watchdeck_cli::demo;

#[derive(Parser)]
#[command(
    name = "watchdeck",
    about = "Reactive watch-page agent: overlay suppression and remote media control",
    version
)]
struct Cli {
    /// Explicit config file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the seeded demo page and execute controller requests against it.
    Demo {
        /// Requests as JSON envelopes or bare action names. Defaults to a
        /// representative script.
        requests: Vec<String>,
    },
    /// List the registered action names.
    Actions,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_ref())?;

    match cli.command {
        Command::Demo { requests } => {
            let envelopes = demo::parse_requests(&requests)?;
            let responses = demo::run(&config, envelopes).await?;
            for response in responses {
                println!("{}", serde_json::to_string(&response)?);
            }
        }
        Command::Actions => {
            let dom = demo::seed_page();
            let agent = watchdeck_bridge::PageAgent::new(dom, config.agent_config()?);
            for name in agent.dispatcher().action_names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}
