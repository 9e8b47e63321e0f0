//! Resumable download of ERA5 reanalysis data from the Climate Data Store.
//!
//! The work grid is `year × month`, plus a `level_type` dimension when pressure or model
//! levels are requested next to the single-level variables. Every unit is one MARS request
//! combining all requested variables of its level type.

use crate::checkpoint::{Checkpoint, CheckpointStore, Dimension, Unit, WorkGrid};
use crate::download::{partial_path, remove_partial_file};
use crate::era5::client::Retrieve;
use crate::era5::error::Era5Error;
use crate::era5::mappings::{
    all_model_levels, mars_param, LevelType, ALL_PRESSURE_LEVELS, DEFAULT_MODEL_LEVELS,
    DEFAULT_PRESSURE_LEVELS, DEFAULT_VARIABLES, MODEL_LEVEL_COUNT,
};
use crate::era5::request::{FileFormat, MarsRequest, DATASET};
use crate::orchestrator::{Orchestrator, RunSummary, UnitDownloader, UnitStatus};
use crate::utils::{all_months, days_in_month, ensure_dir_exists, parse_month};
use bon::bon;
use log::{error, info};
use std::path::PathBuf;

const YEAR: &str = "year";
const MONTH: &str = "month";
const LEVEL_TYPE: &str = "level_type";

pub const DEFAULT_RESOLUTION: &str = "0.25/0.25";

const LIST_HINT: &str = "Run 'era5-download --list-variables' to see available variables.";

/// Downloads ERA5 data for every (year, month[, level type]) unit that is not yet done.
pub struct Era5Downloader<R> {
    orchestrator: Orchestrator,
    fetcher: Era5Fetcher<R>,
}

struct Era5Fetcher<R> {
    client: R,
    output_path: PathBuf,
    variables: Vec<String>,
    pressure_levels: Option<Vec<String>>,
    model_levels: Option<Vec<String>>,
    area: Option<[f64; 4]>,
    resolution: String,
    file_format: FileFormat,
    dry_run: bool,
}

#[bon]
impl<R: Retrieve> Era5Downloader<R> {
    /// Prepares a download run.
    ///
    /// # Arguments
    ///
    /// * `.client(R)`: **Required.** The retrieve client, usually a [`crate::CdsClient`].
    /// * `.output_path(PathBuf)`: **Required.** Directory for the data files and the checkpoint.
    /// * `.years(Vec<i32>)`: **Required.** Years to download.
    /// * `.months(Vec<String>)`: Months `"01"`..`"12"`. Defaults to all months.
    /// * `.variables(Vec<String>)`: ERA5 variable names. Defaults to [`DEFAULT_VARIABLES`].
    /// * `.area([f64; 4])`: Bounding box `[north, west, south, east]`. Defaults to the globe.
    /// * `.resolution(String)`: MARS grid. Defaults to [`DEFAULT_RESOLUTION`].
    /// * `.pressure_levels(Vec<String>)`: Pressure levels in hPa. Empty means the defaults.
    /// * `.model_levels(Vec<String>)`: Model levels `1`..`137`. Empty means the defaults.
    /// * `.single_level_only(bool)`: Skip all 3D level types. Defaults to `false`.
    /// * `.file_format(FileFormat)`: Defaults to GRIB.
    /// * `.resume(bool)` / `.dry_run(bool)`: Default to `false`.
    ///
    /// If neither pressure nor model levels are given (and `single_level_only` is not
    /// set), the default pressure levels are downloaded next to the single-level data.
    ///
    /// # Errors
    ///
    /// * [`Era5Error::InvalidVariables`] for variables missing from the catalogues.
    /// * [`Era5Error::InvalidMonth`] and [`Era5Error::InvalidLevels`] for bad selections.
    /// * [`Era5Error::ConflictingLevels`] if `single_level_only` is combined with levels.
    /// * [`Era5Error::Checkpoint`] for duplicates or an incompatible checkpoint.
    #[builder]
    pub async fn new(
        client: R,
        output_path: PathBuf,
        years: Vec<i32>,
        months: Option<Vec<String>>,
        variables: Option<Vec<String>>,
        area: Option<[f64; 4]>,
        #[builder(default = DEFAULT_RESOLUTION.to_string())] resolution: String,
        pressure_levels: Option<Vec<String>>,
        model_levels: Option<Vec<String>>,
        #[builder(default)] single_level_only: bool,
        #[builder(default)] file_format: FileFormat,
        #[builder(default)] resume: bool,
        #[builder(default)] dry_run: bool,
    ) -> Result<Self, Era5Error> {
        let months = months.unwrap_or_else(all_months);
        if let Some(invalid) = months.iter().find(|m| parse_month(m).is_none()) {
            return Err(Era5Error::InvalidMonth(invalid.clone()));
        }

        let (pressure_levels, model_levels) =
            select_levels(pressure_levels, model_levels, single_level_only)?;

        let variables = match variables {
            Some(variables) => variables,
            None => DEFAULT_VARIABLES
                .iter()
                .filter(|v| !single_level_only || LevelType::Single.supports(v))
                .map(|v| v.to_string())
                .collect(),
        };
        validate_variables(
            &variables,
            pressure_levels.is_some(),
            model_levels.is_some(),
            single_level_only,
        )?;

        ensure_dir_exists(&output_path)
            .await
            .map_err(|e| Era5Error::OutputDir(output_path.clone(), e))?;

        let level_types = active_level_types(pressure_levels.is_some(), model_levels.is_some());
        let area_str = area.map_or_else(|| "World (all)".to_string(), |a| format!("{a:?}"));
        let dry_run_note = if dry_run { " [DRY RUN - NO DATA WILL BE DOWNLOADED]" } else { "" };
        info!(
            "ERA5 Downloader initialised for:{}\n- years:\t\t{:?}\n- months:\t\t{:?}\n- variables:\t\t{:?}\n- area (N,W,S,E):\t{}\n- resolution:\t\t{}\n- file_format:\t\t{}\n- level types:\t\t{:?}",
            dry_run_note,
            years,
            months,
            variables,
            area_str,
            resolution,
            file_format.name(),
            level_types.iter().map(|l| l.key()).collect::<Vec<_>>()
        );

        let mut dimensions = vec![Dimension::new(YEAR, &years), Dimension::new(MONTH, &months)];
        if level_types.len() > 1 {
            dimensions.push(Dimension::new(
                LEVEL_TYPE,
                level_types.iter().map(|l| l.key()),
            ));
        }
        let grid = WorkGrid::new(dimensions)?;
        let orchestrator =
            Orchestrator::new(grid, CheckpointStore::in_dir(&output_path), resume)?;

        Ok(Self {
            orchestrator,
            fetcher: Era5Fetcher {
                client,
                output_path,
                variables,
                pressure_levels,
                model_levels,
                area,
                resolution,
                file_format,
                dry_run,
            },
        })
    }

    /// Downloads every pending unit.
    pub async fn download_data(&mut self) -> Result<RunSummary, Era5Error> {
        let summary = self.orchestrator.run(&mut self.fetcher).await?;
        info!("All downloads completed! ({summary})");
        Ok(summary)
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        self.orchestrator.checkpoint()
    }

    pub fn grid(&self) -> &WorkGrid {
        self.orchestrator.grid()
    }
}

/// Applies the level defaults and checks the requested levels.
fn select_levels(
    pressure_levels: Option<Vec<String>>,
    model_levels: Option<Vec<String>>,
    single_level_only: bool,
) -> Result<(Option<Vec<String>>, Option<Vec<String>>), Era5Error> {
    if single_level_only {
        if pressure_levels.is_some() || model_levels.is_some() {
            return Err(Era5Error::ConflictingLevels);
        }
        return Ok((None, None));
    }

    let or_defaults = |levels: Vec<String>, defaults: &[&str]| {
        if levels.is_empty() {
            defaults.iter().map(|l| l.to_string()).collect()
        } else {
            levels
        }
    };
    let (pressure_levels, model_levels) = match (pressure_levels, model_levels) {
        (None, None) => (Some(or_defaults(Vec::new(), DEFAULT_PRESSURE_LEVELS)), None),
        (pressure, model) => (
            pressure.map(|l| or_defaults(l, DEFAULT_PRESSURE_LEVELS)),
            model.map(|l| or_defaults(l, DEFAULT_MODEL_LEVELS)),
        ),
    };

    if let Some(levels) = &pressure_levels {
        let invalid: Vec<&str> = levels
            .iter()
            .map(String::as_str)
            .filter(|l| !ALL_PRESSURE_LEVELS.contains(l))
            .collect();
        if !invalid.is_empty() {
            return Err(Era5Error::InvalidLevels {
                level_type: LevelType::Pressure.key().to_string(),
                levels: invalid.join(", "),
            });
        }
    }
    if let Some(levels) = &model_levels {
        let invalid: Vec<&str> = levels
            .iter()
            .map(String::as_str)
            .filter(|l| {
                !l.parse::<u32>()
                    .is_ok_and(|level| (1..=MODEL_LEVEL_COUNT).contains(&level))
            })
            .collect();
        if !invalid.is_empty() {
            return Err(Era5Error::InvalidLevels {
                level_type: LevelType::Model.key().to_string(),
                levels: invalid.join(", "),
            });
        }
    }
    Ok((pressure_levels, model_levels))
}

/// Single-level data is always part of a run; 3D level types follow the selected levels.
fn active_level_types(has_pressure: bool, has_model: bool) -> Vec<LevelType> {
    let mut level_types = vec![LevelType::Single];
    if has_pressure {
        level_types.push(LevelType::Pressure);
    }
    if has_model {
        level_types.push(LevelType::Model);
    }
    level_types
}

fn validate_variables(
    variables: &[String],
    has_pressure: bool,
    has_model: bool,
    single_level_only: bool,
) -> Result<(), Era5Error> {
    if variables.is_empty() {
        return Err(Era5Error::InvalidVariables(format!(
            "No variables requested.\n{LIST_HINT}"
        )));
    }

    let mut unknown = Vec::new();
    let mut invalid_pressure = Vec::new();
    let mut invalid_model = Vec::new();
    let mut three_dimensional = Vec::new();

    for variable in variables {
        if LevelType::Single.supports(variable) {
            continue;
        }
        let pressure = LevelType::Pressure.supports(variable);
        let model = LevelType::Model.supports(variable);
        if !pressure && !model {
            unknown.push(variable.as_str());
            continue;
        }
        if single_level_only {
            three_dimensional.push(variable.as_str());
            continue;
        }
        if has_pressure && !pressure {
            invalid_pressure.push(format!("{variable} (not available at pressure levels)"));
        }
        if has_model && !model {
            invalid_model.push(format!("{variable} (not available at model levels)"));
        }
    }

    let mut messages = Vec::new();
    if !unknown.is_empty() {
        messages.push(format!("Unknown variables: {}", unknown.join(", ")));
    }
    if !three_dimensional.is_empty() {
        messages.push(format!(
            "3D variables requested for a single-level-only download: {}",
            three_dimensional.join(", ")
        ));
    }
    if !invalid_pressure.is_empty() {
        messages.push(format!(
            "Invalid pressure-level variables: {}",
            invalid_pressure.join(", ")
        ));
    }
    if !invalid_model.is_empty() {
        messages.push(format!(
            "Invalid model-level variables: {}",
            invalid_model.join(", ")
        ));
    }

    if messages.is_empty() {
        info!("All {} requested variables are available.", variables.len());
        Ok(())
    } else {
        messages.push(LIST_HINT.to_string());
        Err(Era5Error::InvalidVariables(messages.join("\n")))
    }
}

/// `era5_<year>_<month>_<sl|pl|ml>[_<levels>]_<codes>.<ext>`. Levels are only part of
/// the name when they are a subset of the level type's catalogue.
fn output_file_name(
    year: i32,
    month: &str,
    level_type: LevelType,
    levels: Option<&[String]>,
    variables: &[&str],
    file_format: FileFormat,
) -> String {
    let mut suffix = format!("_{}", level_type.file_tag());
    if let Some(levels) = levels {
        let full_catalogue = match level_type {
            LevelType::Single => true,
            LevelType::Pressure => levels
                .iter()
                .map(String::as_str)
                .eq(ALL_PRESSURE_LEVELS.iter().copied()),
            LevelType::Model => levels.iter().eq(all_model_levels().iter()),
        };
        if !full_catalogue {
            suffix.push('_');
            suffix.push_str(&levels.join("-"));
        }
    }
    let codes = variables
        .iter()
        .map(|v| mars_param(v))
        .collect::<Vec<_>>()
        .join("-");
    format!("era5_{year}_{month}{suffix}_{codes}.{}", file_format.extension())
}

impl<R> Era5Fetcher<R> {
    fn level_type(&self, unit: &Unit) -> Result<LevelType, Era5Error> {
        match unit.key(LEVEL_TYPE) {
            Some(_) => Ok(unit.parse_key(LEVEL_TYPE)?),
            None => Ok(LevelType::Single),
        }
    }

    fn levels(&self, level_type: LevelType) -> Option<&[String]> {
        match level_type {
            LevelType::Single => None,
            LevelType::Pressure => self.pressure_levels.as_deref(),
            LevelType::Model => self.model_levels.as_deref(),
        }
    }
}

impl<R: Retrieve> UnitDownloader for Era5Fetcher<R> {
    type Error = Era5Error;

    fn label(&self, unit: &Unit) -> String {
        let level_type = unit.key(LEVEL_TYPE).unwrap_or(LevelType::Single.key());
        match (unit.key(YEAR), unit.key(MONTH)) {
            (Some(year), Some(month)) => format!("{year}-{month} ({level_type})"),
            _ => unit.to_string(),
        }
    }

    async fn download_unit(&mut self, unit: &Unit) -> Result<UnitStatus, Era5Error> {
        let label = self.label(unit);
        let year: i32 = unit.parse_key(YEAR)?;
        let month = unit.require_key(MONTH)?;
        let level_type = self.level_type(unit)?;
        let (month_number, days) = parse_month(month)
            .and_then(|m| Some((m, days_in_month(year, m)?)))
            .ok_or_else(|| Era5Error::InvalidMonth(month.to_string()))?;

        let variables: Vec<&str> = self
            .variables
            .iter()
            .map(String::as_str)
            .filter(|v| level_type.supports(v))
            .collect();
        if variables.is_empty() {
            info!("{label}: No variables requested for this level type.");
            return Ok(UnitStatus::Empty);
        }

        let levels = self.levels(level_type);
        let request = MarsRequest::new(
            year,
            month_number,
            days,
            level_type,
            &variables,
            levels,
            self.area,
            &self.resolution,
            self.file_format,
        );
        let path = self.output_path.join(output_file_name(
            year,
            month,
            level_type,
            levels,
            &variables,
            self.file_format,
        ));

        if self.dry_run {
            let rule = "=".repeat(80);
            println!("\n{rule}");
            println!("DRY RUN: {year}-{month} ({level_type}, {} variables)", variables.len());
            println!("{rule}");
            println!("Dataset: {DATASET}");
            println!("Variables: {}", variables.join(", "));
            println!("Request parameters:");
            print!("{request}");
            println!("Output file (would be): {}", path.display());
            println!("{rule}\n");
            info!("{label}: DRY RUN - Request printed (not submitted)");
            return Ok(UnitStatus::DryRun);
        }

        info!("{label}: Starting download of {} variables...", variables.len());
        match self.client.retrieve(DATASET, &request, &path).await {
            Ok(_) => {
                info!("{label}: Downloaded and saved to {}", path.display());
                Ok(UnitStatus::Completed)
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                error!("{label}: Download failed with error: {e}");
                remove_partial_file(&partial_path(&path)).await;
                Ok(UnitStatus::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::era5::error::CdsError;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Outcome {
        Written,
        JobFailed,
        Unavailable,
    }

    struct FakeRetrieve {
        outcome: Outcome,
        requests: Mutex<Vec<(MarsRequest, PathBuf)>>,
    }

    impl FakeRetrieve {
        fn new(outcome: Outcome) -> Self {
            Self {
                outcome,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl Retrieve for FakeRetrieve {
        async fn retrieve(
            &self,
            dataset: &str,
            request: &MarsRequest,
            target: &Path,
        ) -> Result<u64, CdsError> {
            assert_eq!(dataset, DATASET);
            self.requests
                .lock()
                .unwrap()
                .push((request.clone(), target.to_path_buf()));
            match self.outcome {
                Outcome::Written => {
                    std::fs::write(target, b"GRIB").unwrap();
                    Ok(4)
                }
                Outcome::JobFailed => {
                    std::fs::write(partial_path(target), b"GR").unwrap();
                    Err(CdsError::JobFailed {
                        job_id: "abc".to_string(),
                        status: "failed".to_string(),
                    })
                }
                Outcome::Unavailable => Err(CdsError::ServiceUnavailable),
            }
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_default_levels_add_a_level_type_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020, 2021])
            .months(strings(&["01", "02"]))
            .variables(strings(&["2m_temperature"]))
            .build()
            .await
            .unwrap();

        assert_eq!(downloader.grid().shape(), vec![2, 2, 2]);
        assert_eq!(
            downloader.grid().dimension(LEVEL_TYPE).unwrap().keys(),
            ["single", "pressure"]
        );
    }

    #[tokio::test]
    async fn test_single_level_only_grid_has_two_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020, 2021])
            .months(strings(&["01", "02", "03"]))
            .single_level_only(true)
            .build()
            .await
            .unwrap();

        assert_eq!(downloader.grid().shape(), vec![2, 3]);
        assert!(downloader
            .fetcher
            .variables
            .iter()
            .all(|v| LevelType::Single.supports(v)));
    }

    #[tokio::test]
    async fn test_pressure_and_model_levels_give_three_level_types() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["01"]))
            .variables(strings(&["2m_temperature", "temperature"]))
            .pressure_levels(Vec::new())
            .model_levels(Vec::new())
            .build()
            .await
            .unwrap();

        assert_eq!(downloader.grid().shape(), vec![1, 1, 3]);
        assert_eq!(
            downloader.fetcher.model_levels.as_deref(),
            Some(strings(DEFAULT_MODEL_LEVELS).as_slice())
        );
    }

    #[tokio::test]
    async fn test_single_level_request_and_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["01"]))
            .variables(strings(&["2m_temperature", "surface_pressure"]))
            .single_level_only(true)
            .build()
            .await
            .unwrap();

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.completed, 1);

        let requests = downloader.fetcher.client.requests.lock().unwrap();
        let (request, path) = &requests[0];
        assert_eq!(request.param, "2t/sp");
        assert_eq!(request.date, "2020-01-01/to/2020-01-31");
        assert_eq!(request.levtype, "sfc");
        assert_eq!(path, &dir.path().join("era5_2020_01_sl_2t-sp.grib"));
        assert!(path.exists());
        assert!(downloader.checkpoint().is_done(&[0, 0]));
    }

    #[tokio::test]
    async fn test_pressure_request_lists_selected_levels() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["02"]))
            .variables(strings(&["temperature"]))
            .pressure_levels(strings(&["1000", "950"]))
            .file_format(FileFormat::NetCdf)
            .build()
            .await
            .unwrap();

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.completed, 1);

        let requests = downloader.fetcher.client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (request, path) = &requests[0];
        assert_eq!(request.levelist.as_deref(), Some("1000/950"));
        assert_eq!(request.date, "2020-02-01/to/2020-02-29");
        assert_eq!(path, &dir.path().join("era5_2020_02_pl_1000-950_t.nc"));
    }

    #[tokio::test]
    async fn test_dry_run_never_retrieves() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["01", "02"]))
            .variables(strings(&["2m_temperature", "temperature"]))
            .dry_run(true)
            .build()
            .await
            .unwrap();

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.dry_run, 4);
        assert!(downloader.fetcher.client.requests.lock().unwrap().is_empty());
        assert_eq!(downloader.checkpoint().completed_count(), 0);
    }

    #[tokio::test]
    async fn test_resumed_run_skips_finished_units() {
        let dir = tempfile::tempdir().unwrap();
        let build = || {
            Era5Downloader::builder()
                .client(FakeRetrieve::new(Outcome::Written))
                .output_path(dir.path().to_path_buf())
                .years(vec![2020])
                .months(strings(&["01", "02"]))
                .variables(strings(&["2m_temperature"]))
                .single_level_only(true)
                .resume(true)
                .build()
        };

        let mut first = build().await.unwrap();
        assert_eq!(first.download_data().await.unwrap().completed, 2);

        let mut second = build().await.unwrap();
        let summary = second.download_data().await.unwrap();
        assert_eq!(summary.attempted(), 0);
        assert_eq!(summary.skipped, 2);
        assert!(second.fetcher.client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_retrieval_removes_partial_file_and_stays_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::JobFailed))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["01"]))
            .variables(strings(&["2m_temperature"]))
            .single_level_only(true)
            .build()
            .await
            .unwrap();

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.failed, 1);
        let target = dir.path().join("era5_2020_01_sl_2t.grib");
        assert!(!target.exists());
        assert!(!partial_path(&target).exists());
        assert!(!downloader.checkpoint().is_done(&[0, 0]));
    }

    #[tokio::test]
    async fn test_failed_retry_keeps_file_of_earlier_run() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("era5_2020_01_sl_2t.grib");
        std::fs::write(&target, b"GRIB").unwrap();
        let mut downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::JobFailed))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["01"]))
            .variables(strings(&["2m_temperature"]))
            .single_level_only(true)
            .build()
            .await
            .unwrap();

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(std::fs::read(&target).unwrap(), b"GRIB");
        assert!(!partial_path(&target).exists());
    }

    #[tokio::test]
    async fn test_unavailable_service_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Unavailable))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["01", "02"]))
            .variables(strings(&["2m_temperature"]))
            .single_level_only(true)
            .build()
            .await
            .unwrap();

        let err = downloader.download_data().await.unwrap_err();
        assert!(matches!(err, Era5Error::Cds(CdsError::ServiceUnavailable)));
        assert_eq!(downloader.fetcher.client.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_variables_are_reported() {
        let err = validate_variables(&strings(&["2m_temperature", "banana"]), true, false, false)
            .unwrap_err();
        assert!(err.to_string().contains("Unknown variables: banana"));
    }

    #[test]
    fn test_3d_variables_are_valid_for_both_level_types() {
        let variables = strings(&["2m_temperature", "temperature", "specific_humidity"]);
        assert!(validate_variables(&variables, true, true, false).is_ok());
        assert!(validate_variables(&[], true, false, false).is_err());
    }

    #[test]
    fn test_single_level_only_rejects_3d_variables_and_levels() {
        assert!(validate_variables(&strings(&["temperature"]), false, false, true).is_err());
        assert!(matches!(
            select_levels(Some(strings(&["1000"])), None, true),
            Err(Era5Error::ConflictingLevels)
        ));
    }

    #[test]
    fn test_level_selection_defaults_and_validation() {
        let (pressure, model) = select_levels(None, None, false).unwrap();
        assert_eq!(pressure, Some(strings(DEFAULT_PRESSURE_LEVELS)));
        assert_eq!(model, None);

        let (pressure, model) = select_levels(None, Some(strings(&["1", "137"])), false).unwrap();
        assert_eq!(pressure, None);
        assert_eq!(model, Some(strings(&["1", "137"])));

        let err = select_levels(Some(strings(&["999"])), None, false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid pressure levels: 999");
        assert!(select_levels(None, Some(strings(&["0", "138"])), false).is_err());
    }

    #[test]
    fn test_full_catalogue_levels_are_left_out_of_file_names() {
        let all: Vec<String> = strings(ALL_PRESSURE_LEVELS);
        assert_eq!(
            output_file_name(2020, "03", LevelType::Pressure, Some(&all), &["temperature"], FileFormat::Grib),
            "era5_2020_03_pl_t.grib"
        );
        let model = strings(&["136", "137"]);
        assert_eq!(
            output_file_name(
                2020,
                "03",
                LevelType::Model,
                Some(&model),
                &["temperature", "specific_humidity"],
                FileFormat::Grib
            ),
            "era5_2020_03_ml_136-137_t-q.grib"
        );
    }

    #[tokio::test]
    async fn test_invalid_month_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = Era5Downloader::builder()
            .client(FakeRetrieve::new(Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .months(strings(&["13"]))
            .build()
            .await;
        assert!(matches!(result, Err(Era5Error::InvalidMonth(ref m)) if m == "13"));
    }
}
