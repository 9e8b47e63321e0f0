use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn};
use rbc_download::cli::{init_logging, CommonArgs};
use rbc_download::{zones_for_country, EntsoeClient, EntsoeConfig, EntsoeDownloader, EntsoeError};

/// Download actual generation per generation unit from the ENTSO-E transparency platform.
#[derive(Parser, Debug)]
#[command(name = "entsoe-download", version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// EIC codes of the bidding zones, e.g. `-b 10YES-REE------0`. Default: all zones
    #[arg(short, long, num_args = 1.., conflicts_with = "country")]
    bidding_zones: Option<Vec<String>>,

    /// Download every bidding zone of an ISO 3166 country code, e.g. `--country ES`
    #[arg(short, long)]
    country: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config: EntsoeConfig = cli
        .common
        .load_config()
        .context("Failed to load the entsoe config")?;
    info!("Config loaded for entsoe:\n{config:?}");

    if cli.common.months.is_some() {
        warn!("--months is ignored, ENTSO-E data is downloaded per year");
    }

    let bidding_zones = match (&cli.bidding_zones, &cli.country) {
        (Some(zones), _) => Some(zones.clone()),
        (None, Some(country)) => {
            let zones = zones_for_country(country);
            if zones.is_empty() {
                bail!(EntsoeError::UnknownCountry(country.clone()));
            }
            Some(zones.into_iter().map(String::from).collect())
        }
        (None, None) => None,
    };

    let mut downloader = EntsoeDownloader::builder()
        .source(EntsoeClient::new(&config.access.api_key)?)
        .output_path(config.paths.dst_dir_raw.clone())
        .years(cli.common.years_or(2010..=2025))
        .maybe_bidding_zones(bidding_zones)
        .resume(cli.common.resume)
        .dry_run(cli.common.dry_run)
        .build()
        .await
        .context("Failed to set up the ENTSO-E download")?;

    let summary = downloader.download_data().await?;
    info!("Finished: {summary}");
    Ok(())
}
