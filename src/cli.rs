//! Command-line plumbing shared by the downloader binaries.

use crate::config::{load_source_config, parse_key_value_pairs, ConfigError, SourceSchema};
use crate::utils::resolve_configs_dir;
use clap::Args;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Flags every downloader accepts.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Years to download, e.g. `-y 2020 2021`
    #[arg(short, long, num_args = 1..)]
    pub years: Option<Vec<i32>>,

    /// Months to download (01-12). Defaults to all months
    #[arg(short, long, num_args = 1..)]
    pub months: Option<Vec<String>>,

    /// Continue from the checkpoint in the output directory
    #[arg(long)]
    pub resume: bool,

    /// Report the requests without downloading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Override config values, e.g. `-o paths.dst_dir_raw=/data/raw`
    #[arg(short = 'o', long = "cfg-options", value_name = "KEY=VALUE")]
    pub cfg_options: Vec<String>,

    /// Directory holding the per-source YAML files
    #[arg(long, env = "RBC_CONFIGS_DIR")]
    pub configs_dir: Option<PathBuf>,
}

impl CommonArgs {
    /// The requested years, or `default` if none were given.
    pub fn years_or(&self, default: RangeInclusive<i32>) -> Vec<i32> {
        self.years.clone().unwrap_or_else(|| default.collect())
    }

    /// Loads the config of `T`'s source with the `--cfg-options` overrides applied.
    pub fn load_config<T: SourceSchema>(&self) -> Result<T, ConfigError> {
        let configs_dir = resolve_configs_dir(self.configs_dir.as_deref())?;
        let overrides = if self.cfg_options.is_empty() {
            None
        } else {
            Some(parse_key_value_pairs(&self.cfg_options)?)
        };
        load_source_config(&configs_dir, overrides.as_ref())
    }
}

/// Installs the fmt subscriber. `RUST_LOG` selects the level, `info` by default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
