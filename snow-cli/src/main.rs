//! snow-cli - seasonal snowfall stats, records, contests and forecasts from NOAA ACIS.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "snow-cli",
    version,
    about = "Seasonal snowfall analytics toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: snow_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("snow-cli {}", env!("CARGO_PKG_VERSION"));
    snow_cmd::run(cli.command).await
}
