pub mod error;
pub mod loader;
pub mod overrides;
pub mod schema;

pub use error::ConfigError;
pub use loader::{load_config, load_source_config};
pub use overrides::{deep_update, parse_key_value_pairs};
pub use schema::{
    ApiAccess, CdsAccess, EntsoeConfig, Era5Config, IconDreamGlobalConfig, Paths, Source,
    SourceConfig, SourceSchema, DEFAULT_CDS_API_URL,
};
