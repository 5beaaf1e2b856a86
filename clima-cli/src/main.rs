//! Clima CLI - Command line tool for climate-station analytics.

use clap::Parser;
use clima_store::{CsvDirectory, StationCache};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "clima-cli",
    version,
    about = "Climate station series toolkit"
)]
struct Cli {
    /// Directory searched recursively for station files
    #[arg(long, env = "CLIMA_DATA_DIR", default_value = "data/csv")]
    data_dir: PathBuf,

    /// Stations to load before running the command
    #[arg(long, value_delimiter = ',')]
    preload: Vec<String>,

    #[command(subcommand)]
    command: clima_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cache = StationCache::new(CsvDirectory::new(cli.data_dir));
    for failure in cache.preload(&cli.preload).await {
        log::warn!("[Clima] preload: {}", failure);
    }

    let document = clima_cmd::run(&cache, cli.command).await?;
    println!("{document}");
    Ok(())
}
