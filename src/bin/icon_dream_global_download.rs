use anyhow::Context;
use clap::Parser;
use log::info;
use rbc_download::cli::{init_logging, CommonArgs};
use rbc_download::{
    discover_variables, variables_report, DwdClient, IconDreamDownloader, IconDreamGlobalConfig,
};

/// Download ICON-DREAM-Global reanalysis data from the DWD open-data portal.
#[derive(Parser, Debug)]
#[command(name = "icon-dream-global-download", version)]
struct Cli {
    /// List available variables and exit
    #[arg(long)]
    list_variables: bool,

    #[command(flatten)]
    common: CommonArgs,

    /// Variables to download. Default: T
    #[arg(short, long, num_args = 1..)]
    variables: Option<Vec<String>>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let client = DwdClient::new()?;

    if cli.list_variables {
        let variables = discover_variables(&client).await;
        print!("{}", variables_report(&variables));
        return Ok(());
    }

    info!("Loading 'icon_dream_global' YAML config...");
    let config: IconDreamGlobalConfig = cli
        .common
        .load_config()
        .context("Failed to load the icon_dream_global config")?;
    info!("Config loaded for icon_dream_global:\n{config:?}");

    let mut downloader = IconDreamDownloader::builder()
        .source(client)
        .output_path(config.paths.dst_dir_raw.clone())
        .years(cli.common.years_or(2020..=2025))
        .maybe_months(cli.common.months.clone())
        .maybe_variables(cli.variables)
        .resume(cli.common.resume)
        .dry_run(cli.common.dry_run)
        .build()
        .await
        .context("Failed to set up the ICON-DREAM download")?;

    downloader.download_data().await?;
    Ok(())
}
