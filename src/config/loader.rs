use crate::config::error::ConfigError;
use crate::config::overrides::deep_update;
use crate::config::schema::{
    EntsoeConfig, Era5Config, IconDreamGlobalConfig, Source, SourceConfig, SourceSchema,
};
use log::debug;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Loads and validates `<configs_dir>/<source>.yaml`.
///
/// The file is looked up before the source name is checked against the registry, so a
/// missing file is reported as such even for an unregistered source.
///
/// # Arguments
///
/// * `source` - Name of the data source, e.g. `"entsoe"`.
/// * `configs_dir` - Directory holding one YAML file per source.
/// * `overrides` - Optional nested mapping (see [`crate::parse_key_value_pairs`]) merged
///   into the file contents before validation.
///
/// # Errors
///
/// * [`ConfigError::Missing`] if the file does not exist.
/// * [`ConfigError::UnknownSource`] if no schema is registered for `source`.
/// * [`ConfigError::Parse`], [`ConfigError::Invalid`] or an access error if the contents are rejected.
///
/// # Examples
///
/// ```no_run
/// use rbc_download::{load_config, Source};
/// use std::path::Path;
///
/// let cfg = load_config("entsoe", Path::new("configs"), None)?;
/// assert_eq!(cfg.source(), Source::Entsoe);
/// # Ok::<(), rbc_download::ConfigError>(())
/// ```
pub fn load_config(
    source: &str,
    configs_dir: &Path,
    overrides: Option<&Mapping>,
) -> Result<SourceConfig, ConfigError> {
    let document = read_document(source, configs_dir, overrides)?;

    match source.parse::<Source>()? {
        Source::Entsoe => validate_document::<EntsoeConfig>(document).map(SourceConfig::Entsoe),
        Source::Era5 => validate_document::<Era5Config>(document).map(SourceConfig::Era5),
        Source::IconDreamGlobal => {
            validate_document::<IconDreamGlobalConfig>(document).map(SourceConfig::IconDreamGlobal)
        }
    }
}

/// Typed variant of [`load_config`] for callers that know their schema.
pub fn load_source_config<T: SourceSchema>(
    configs_dir: &Path,
    overrides: Option<&Mapping>,
) -> Result<T, ConfigError> {
    let document = read_document(T::SOURCE.name(), configs_dir, overrides)?;
    validate_document(document)
}

fn read_document(
    source: &str,
    configs_dir: &Path,
    overrides: Option<&Mapping>,
) -> Result<Mapping, ConfigError> {
    let path = configs_dir.join(format!("{source}.yaml"));
    if !path.is_file() {
        return Err(ConfigError::Missing {
            source_name: source.to_string(),
            path,
        });
    }

    let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read(path.clone(), e))?;
    let value: Value =
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse(path.clone(), e))?;
    let mut document = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(ConfigError::NotAMapping(path)),
    };

    if let Some(declared) = document.get("source") {
        let declared = declared.as_str().unwrap_or_default();
        if declared != source {
            return Err(ConfigError::SourceMismatch {
                expected: source.to_string(),
                found: declared.to_string(),
            });
        }
    }
    document.remove("source");

    if let Some(overrides) = overrides {
        debug!("Applying {} config override group(s) for {source}", overrides.len());
        deep_update(&mut document, overrides);
    }

    Ok(document)
}

fn validate_document<T: SourceSchema>(document: Mapping) -> Result<T, ConfigError> {
    let config: T = serde_yaml::from_value(Value::Mapping(document))
        .map_err(|e| ConfigError::Invalid(T::SOURCE.name().to_string(), e))?;
    config.validate()?;
    Ok(config)
}
