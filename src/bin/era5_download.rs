use anyhow::Context;
use clap::Parser;
use log::info;
use rbc_download::cli::{init_logging, CommonArgs};
use rbc_download::{available_variables_report, CdsClient, Era5Config, Era5Downloader, FileFormat};

/// Download ERA5 reanalysis data from the Copernicus Climate Data Store.
#[derive(Parser, Debug)]
#[command(name = "era5-download", version)]
struct Cli {
    /// List all available ERA5 variables and exit
    #[arg(long)]
    list_variables: bool,

    #[command(flatten)]
    common: CommonArgs,

    /// ERA5 variables. Default: common renewable energy variables
    #[arg(short, long, num_args = 1..)]
    variables: Option<Vec<String>>,

    /// Bounding box in degrees. Default: World (all)
    #[arg(
        short,
        long,
        num_args = 4,
        allow_negative_numbers = true,
        value_names = ["NORTH", "WEST", "SOUTH", "EAST"]
    )]
    area: Option<Vec<f64>>,

    /// MARS grid resolution
    #[arg(long, default_value = rbc_download::DEFAULT_RESOLUTION)]
    resolution: String,

    /// Pressure levels in hPa. Pass the flag alone for the defaults (1000 975 950)
    #[arg(long, num_args = 0..)]
    pressure_levels: Option<Vec<String>>,

    /// Model levels (1-137). Pass the flag alone for the defaults (133-137)
    #[arg(long, num_args = 0..)]
    model_levels: Option<Vec<String>>,

    /// Only download single-level (2D) variables
    #[arg(long, conflicts_with_all = ["pressure_levels", "model_levels"])]
    single_level_only: bool,

    /// Output file format: grib or netcdf
    #[arg(short, long, default_value = "grib")]
    file_format: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    if cli.list_variables {
        print!("{}", available_variables_report());
        return Ok(());
    }

    let config: Era5Config = cli
        .common
        .load_config()
        .context("Failed to load the era5 config")?;
    info!("Config loaded for era5:\n{config:?}");

    let file_format: FileFormat = cli.file_format.parse()?;
    let area = cli
        .area
        .map(|a| <[f64; 4]>::try_from(a.as_slice()))
        .transpose()
        .context("--area takes exactly four values")?;
    let client = CdsClient::new(config.access.api_url(), &config.access.api_key)?;

    let mut downloader = Era5Downloader::builder()
        .client(client)
        .output_path(config.paths.dst_dir_raw.clone())
        .years(cli.common.years_or(2020..=2025))
        .maybe_months(cli.common.months.clone())
        .maybe_variables(cli.variables)
        .maybe_area(area)
        .resolution(cli.resolution)
        .maybe_pressure_levels(cli.pressure_levels)
        .maybe_model_levels(cli.model_levels)
        .single_level_only(cli.single_level_only)
        .file_format(file_format)
        .resume(cli.common.resume)
        .dry_run(cli.common.dry_run)
        .build()
        .await
        .context("Failed to set up the ERA5 download")?;

    downloader.download_data().await?;
    Ok(())
}
