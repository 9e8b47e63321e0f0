//! Command-line overrides of config values, given as `dotted.key=value`.

use crate::config::error::ConfigError;
use serde_yaml::{Mapping, Value};

/// Parses `key=value` pairs with dotted keys into a nested mapping.
///
/// Values are kept as strings and converted by the typed schema later. The literal
/// `none` (any case) becomes `Null`, which [`deep_update`] treats as "remove this key".
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOverride`] for a pair without `=` or with an empty key segment.
///
/// # Examples
///
/// ```
/// use rbc_download::parse_key_value_pairs;
///
/// let overrides = parse_key_value_pairs(&["paths.dst_dir_raw=/data/entsoe".to_string()]).unwrap();
/// assert_eq!(
///     overrides["paths"]["dst_dir_raw"].as_str(),
///     Some("/data/entsoe")
/// );
/// ```
pub fn parse_key_value_pairs(pairs: &[String]) -> Result<Mapping, ConfigError> {
    let mut root = Mapping::new();

    for pair in pairs {
        let (key, raw_value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(pair.clone()))?;
        let segments: Vec<&str> = key.trim().split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidOverride(pair.clone()));
        }
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(ConfigError::InvalidOverride(pair.clone()));
        };

        let value = if raw_value.eq_ignore_ascii_case("none") {
            Value::Null
        } else {
            Value::String(raw_value.to_string())
        };

        let mut current = &mut root;
        for segment in parents {
            let key = Value::String((*segment).to_string());
            if !matches!(current.get(&key), Some(Value::Mapping(_))) {
                current.insert(key.clone(), Value::Mapping(Mapping::new()));
            }
            current = match current.get_mut(&key) {
                Some(Value::Mapping(nested)) => nested,
                _ => return Err(ConfigError::InvalidOverride(pair.clone())),
            };
        }
        current.insert(Value::String((*leaf).to_string()), value);
    }

    Ok(root)
}

/// Recursively merges `overrides` into `base`.
///
/// Nested mappings are merged key by key, any other value replaces the target,
/// and a `Null` override removes the key from `base`.
pub fn deep_update(base: &mut Mapping, overrides: &Mapping) {
    for (key, value) in overrides {
        match value {
            Value::Null => {
                base.remove(key);
            }
            Value::Mapping(nested) => match base.get_mut(key) {
                Some(Value::Mapping(existing)) => deep_update(existing, nested),
                _ => {
                    let mut fresh = Mapping::new();
                    deep_update(&mut fresh, nested);
                    base.insert(key.clone(), Value::Mapping(fresh));
                }
            },
            other => {
                base.insert(key.clone(), other.clone());
            }
        }
    }
}
