use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file for '{source_name}' is missing: {path}")]
    Missing { source_name: String, path: PathBuf },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse YAML in config file '{0}'")]
    Parse(PathBuf, #[source] serde_yaml::Error),

    #[error("Config file '{0}' must contain a mapping at the top level")]
    NotAMapping(PathBuf),

    #[error("Config file for '{expected}' declares source '{found}'")]
    SourceMismatch { expected: String, found: String },

    #[error("Invalid configuration for '{0}'")]
    Invalid(String, #[source] serde_yaml::Error),

    #[error("Access field '{0}' is empty")]
    EmptyAccessField(String),

    #[error("Access field '{field}' still contains the placeholder '{value}'!")]
    PlaceholderAccessField { field: String, value: String },

    #[error("Invalid override '{0}': expected <dotted.key>=<value>")]
    InvalidOverride(String),

    #[error("Could not determine a configuration directory")]
    ConfigDirResolution,
}
