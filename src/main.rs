//! swapi-ingest CLI: fetch every person, resolve references, store flattened rows.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use swapi_ingest::engine::{Cli, handle_ingest};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_ingest(&cli).await?;
    log::info!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
