//! Typed configuration schemas, one per data source.

use crate::config::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default endpoint of the Copernicus Climate Data Store API.
pub const DEFAULT_CDS_API_URL: &str = "https://cds.climate.copernicus.eu/api";

const PLACEHOLDER_MARKERS: [&str; 2] = ["YOUR-SECRET", "COMMIT"];

/// The registered data sources. The name of each is also the stem of its config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Entsoe,
    Era5,
    IconDreamGlobal,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Entsoe, Source::Era5, Source::IconDreamGlobal];

    pub fn name(self) -> &'static str {
        match self {
            Source::Entsoe => "entsoe",
            Source::Era5 => "era5",
            Source::IconDreamGlobal => "icon_dream_global",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.name() == s)
            .ok_or_else(|| ConfigError::UnknownSource(s.to_string()))
    }
}

/// Filesystem paths used by a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paths {
    /// Destination directory for raw downloads and the checkpoint file.
    pub dst_dir_raw: PathBuf,
}

/// Access block of sources that only need an API key / security token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiAccess {
    pub api_key: String,
}

/// Access block of the Climate Data Store.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CdsAccess {
    pub api_key: String,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl CdsAccess {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_CDS_API_URL)
    }
}

impl fmt::Debug for ApiAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiAccess")
            .field("api_key", &"***")
            .finish()
    }
}

impl fmt::Debug for CdsAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdsAccess")
            .field("api_key", &"***")
            .field("api_url", &self.api_url())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntsoeConfig {
    pub paths: Paths,
    pub access: ApiAccess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Era5Config {
    pub paths: Paths,
    pub access: CdsAccess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconDreamGlobalConfig {
    pub paths: Paths,
}

/// A schema that can be loaded for one [`Source`].
pub trait SourceSchema: DeserializeOwned {
    const SOURCE: Source;

    /// Checks that go beyond deserialization.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

impl SourceSchema for EntsoeConfig {
    const SOURCE: Source = Source::Entsoe;

    fn validate(&self) -> Result<(), ConfigError> {
        validate_access(&self.access)
    }
}

impl SourceSchema for Era5Config {
    const SOURCE: Source = Source::Era5;

    fn validate(&self) -> Result<(), ConfigError> {
        validate_access(&self.access)
    }
}

impl SourceSchema for IconDreamGlobalConfig {
    const SOURCE: Source = Source::IconDreamGlobal;
}

/// Any validated source config, as returned by [`crate::load_config`].
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Entsoe(EntsoeConfig),
    Era5(Era5Config),
    IconDreamGlobal(IconDreamGlobalConfig),
}

impl SourceConfig {
    pub fn source(&self) -> Source {
        match self {
            SourceConfig::Entsoe(_) => Source::Entsoe,
            SourceConfig::Era5(_) => Source::Era5,
            SourceConfig::IconDreamGlobal(_) => Source::IconDreamGlobal,
        }
    }

    pub fn paths(&self) -> &Paths {
        match self {
            SourceConfig::Entsoe(cfg) => &cfg.paths,
            SourceConfig::Era5(cfg) => &cfg.paths,
            SourceConfig::IconDreamGlobal(cfg) => &cfg.paths,
        }
    }
}

/// Rejects empty or placeholder string values anywhere in an access block.
pub(crate) fn validate_access<T: Serialize>(access: &T) -> Result<(), ConfigError> {
    let value = serde_yaml::to_value(access)
        .map_err(|e| ConfigError::Invalid("access".to_string(), e))?;
    let Value::Mapping(fields) = value else {
        return Ok(());
    };

    for (field, value) in &fields {
        let (Some(field), Some(value)) = (field.as_str(), value.as_str()) else {
            continue;
        };
        if value.trim().is_empty() {
            return Err(ConfigError::EmptyAccessField(field.to_string()));
        }
        if PLACEHOLDER_MARKERS.iter().any(|marker| value.contains(marker)) {
            return Err(ConfigError::PlaceholderAccessField {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
