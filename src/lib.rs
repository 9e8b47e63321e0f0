mod checkpoint;
pub mod cli;
mod config;
mod download;
mod entsoe;
mod era5;
mod error;
mod icon_dream;
mod orchestrator;
mod utils;

pub use error::RbcError;

pub use checkpoint::{
    Checkpoint, CheckpointError, CheckpointStore, Dimension, Unit, Units, WorkGrid,
    CHECKPOINT_FILE_NAME,
};
pub use orchestrator::{Orchestrator, RunSummary, UnitDownloader, UnitStatus};

pub use config::{
    deep_update, load_config, load_source_config, parse_key_value_pairs, ApiAccess, CdsAccess,
    ConfigError, EntsoeConfig, Era5Config, IconDreamGlobalConfig, Paths, Source, SourceConfig,
    SourceSchema, DEFAULT_CDS_API_URL,
};

pub use download::{remove_partial_file, send_checked, stream_to_file, DownloadError};

pub use entsoe::{
    all_zone_codes, zones_for_country, BiddingZone, EntsoeClient, EntsoeDownloader, EntsoeError,
    GenerationRecord, GenerationReply, GenerationSource, BIDDING_ZONES,
};

pub use era5::{
    available_variables_report, mars_param, CdsClient, CdsError, Era5Downloader, Era5Error,
    FileFormat, LevelType, MarsRequest, Retrieve, DATASET as ERA5_DATASET, DEFAULT_CDS_URL,
    DEFAULT_RESOLUTION,
};

pub use icon_dream::{
    discover_variables, fallback_variables, variables_report, DwdClient, IconDreamDownloader,
    IconDreamError, OpenDataSource,
};

pub use utils::{all_months, days_in_month, parse_month, resolve_configs_dir};
