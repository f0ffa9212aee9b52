use clap::Parser;
use ecs_sidecar_supervisor_rs::{logger, run_main, Cli, Error, Outcome, Settings, APP};
use std::process;
use std::sync::Arc;
use tracing::error;

// Exit code for launch and metadata failures
const FAILURE: i32 = 1;

async fn run(cli: &Cli) -> Result<Outcome, Error> {
    let settings = Settings::from_cli(cli);
    let api = Arc::new(cli.metadata_client()?);
    run_main(api, settings).await
}

#[tokio::main]
async fn main() {
    logger::init(APP);

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(e) => {
            error!("{}", e);
            process::exit(FAILURE);
        }
    }
}
