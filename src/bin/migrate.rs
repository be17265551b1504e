//! swapi-migrate CLI: create the people table if it does not exist.

use anyhow::Result;
use clap::Parser;
use swapi_ingest::engine::{Cli, handle_migrate};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    handle_migrate(&cli).await
}
