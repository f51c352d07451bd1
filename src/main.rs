use anyhow::Result;
use clap::Parser;

use pantrypal::{
    cli::Cli,
    runtime::Orchestrator,
    utils::{init_logger, notify_error},
};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        notify_error(format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let orchestrator = Orchestrator::new(cli)?;
    orchestrator.run().await
}
