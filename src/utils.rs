use crate::config::ConfigError;
use chrono::{Datelike, NaiveDate};
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "rbc";
const LOCAL_CONFIGS_DIR: &str = "configs";

/// The twelve months as the two-digit keys used in grids and file names.
pub fn all_months() -> Vec<String> {
    (1..=12).map(|m| format!("{m:02}")).collect()
}

/// Parses a `"01"`..`"12"` month key.
pub fn parse_month(month: &str) -> Option<u32> {
    month.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

/// Number of days in `month` of `year`, leap years included.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt().map(|last| last.day())
}

/// Picks the directory holding the per-source YAML files.
///
/// An explicit directory (from `--configs-dir` or `RBC_CONFIGS_DIR`) wins, then a
/// `configs/` directory in the working directory, then `<config dir>/rbc`.
pub fn resolve_configs_dir(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_CONFIGS_DIR);
    if local.is_dir() {
        return Ok(local);
    }
    dirs::config_dir()
        .map(|p| p.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::ConfigDirResolution)
}

/// Creates `path` (and parents) unless it already is a directory.
pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Output path exists but is not a directory: {}", path.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating output directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}
