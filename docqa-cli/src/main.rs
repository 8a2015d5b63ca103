//! `docqa` binary entry point.

use anyhow::Result;
use clap::Parser;
use docqa_cli::{Cli, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    docqa_cli::run(cli).await
}
