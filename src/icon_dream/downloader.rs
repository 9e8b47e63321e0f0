//! Resumable download of ICON-DREAM-Global hourly files from the DWD open-data portal.
//!
//! The work grid is `year × month × variable`; every unit is one monthly GRIB file.

use crate::checkpoint::{Checkpoint, CheckpointStore, Dimension, Unit, WorkGrid};
use crate::download::remove_partial_file;
use crate::icon_dream::catalogue::{fallback_variables, DEFAULT_VARIABLES};
use crate::icon_dream::client::{file_name, OpenDataSource};
use crate::icon_dream::error::IconDreamError;
use crate::orchestrator::{Orchestrator, RunSummary, UnitDownloader, UnitStatus};
use crate::utils::{all_months, ensure_dir_exists, parse_month};
use bon::bon;
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;

const YEAR: &str = "year";
const MONTH: &str = "month";
const VARIABLE: &str = "variable";

pub struct IconDreamDownloader<S> {
    orchestrator: Orchestrator,
    fetcher: IconDreamFetcher<S>,
    available_variables: BTreeSet<String>,
}

struct IconDreamFetcher<S> {
    source: S,
    output_path: PathBuf,
    dry_run: bool,
}

/// Variables offered by `source`, or the built-in set if the listing is unusable.
pub async fn discover_variables<S: OpenDataSource>(source: &S) -> BTreeSet<String> {
    info!("Discovering available data from DWD...");
    match source.list_variables().await {
        Ok(variables) if !variables.is_empty() => {
            info!("Discovered {} available variables from DWD", variables.len());
            variables
        }
        Ok(_) => {
            warn!("No variables found in DWD directory, using defaults");
            fallback_variables()
        }
        Err(e) => {
            warn!("Error discovering variables: {e}, using defaults");
            fallback_variables()
        }
    }
}

#[bon]
impl<S: OpenDataSource> IconDreamDownloader<S> {
    /// Prepares a download run.
    ///
    /// # Arguments
    ///
    /// * `.source(S)`: **Required.** Usually a [`crate::DwdClient`].
    /// * `.output_path(PathBuf)`: **Required.** Directory for the GRIB files and the checkpoint.
    /// * `.years(Vec<i32>)`: **Required.**
    /// * `.months(Vec<String>)`: Defaults to all months.
    /// * `.variables(Vec<String>)`: Defaults to `["T"]`.
    /// * `.resume(bool)` / `.dry_run(bool)`: Default to `false`.
    ///
    /// # Errors
    ///
    /// [`IconDreamError::InvalidVariables`] if a variable is not offered by the portal.
    #[builder]
    pub async fn new(
        source: S,
        output_path: PathBuf,
        years: Vec<i32>,
        months: Option<Vec<String>>,
        variables: Option<Vec<String>>,
        #[builder(default)] resume: bool,
        #[builder(default)] dry_run: bool,
    ) -> Result<Self, IconDreamError> {
        let months = months.unwrap_or_else(all_months);
        if let Some(invalid) = months.iter().find(|m| parse_month(m).is_none()) {
            return Err(IconDreamError::InvalidMonth(invalid.clone()));
        }
        let variables = variables
            .unwrap_or_else(|| DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect());

        ensure_dir_exists(&output_path)
            .await
            .map_err(|e| IconDreamError::OutputDir(output_path.clone(), e))?;

        let dry_run_note = if dry_run { " [DRY RUN - NO DATA WILL BE DOWNLOADED]" } else { "" };
        info!(
            "ICON-DREAM Downloader initialised for:{}\n- years:\t\t{:?}\n- months:\t\t{:?}\n- variables:\t\t{:?}",
            dry_run_note, years, months, variables
        );

        let available_variables = discover_variables(&source).await;
        let invalid: Vec<&str> = variables
            .iter()
            .map(String::as_str)
            .filter(|v| !available_variables.contains(*v))
            .collect();
        if !invalid.is_empty() {
            return Err(IconDreamError::InvalidVariables {
                invalid: invalid.join(", "),
                available: available_variables
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        info!("All {} requested variables are available.", variables.len());

        let grid = WorkGrid::new(vec![
            Dimension::new(YEAR, &years),
            Dimension::new(MONTH, &months),
            Dimension::new(VARIABLE, &variables),
        ])?;
        let orchestrator =
            Orchestrator::new(grid, CheckpointStore::in_dir(&output_path), resume)?;

        Ok(Self {
            orchestrator,
            fetcher: IconDreamFetcher {
                source,
                output_path,
                dry_run,
            },
            available_variables,
        })
    }

    pub async fn download_data(&mut self) -> Result<RunSummary, IconDreamError> {
        let summary = self.orchestrator.run(&mut self.fetcher).await?;
        info!("All downloads completed! ({summary})");
        Ok(summary)
    }

    pub fn available_variables(&self) -> &BTreeSet<String> {
        &self.available_variables
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        self.orchestrator.checkpoint()
    }

    pub fn grid(&self) -> &WorkGrid {
        self.orchestrator.grid()
    }
}

impl<S: OpenDataSource> UnitDownloader for IconDreamFetcher<S> {
    type Error = IconDreamError;

    fn label(&self, unit: &Unit) -> String {
        match (unit.key(YEAR), unit.key(MONTH), unit.key(VARIABLE)) {
            (Some(year), Some(month), Some(variable)) => format!("{year}-{month} ({variable})"),
            _ => unit.to_string(),
        }
    }

    async fn download_unit(&mut self, unit: &Unit) -> Result<UnitStatus, IconDreamError> {
        let label = self.label(unit);
        let year: i32 = unit.parse_key(YEAR)?;
        let month = unit.require_key(MONTH)?;
        let variable = unit.require_key(VARIABLE)?;

        let file_name = file_name(year, month, variable);
        let target = self.output_path.join(&file_name);

        if target.exists() {
            info!("{label}: File already exists locally, skipping");
            return Ok(UnitStatus::Completed);
        }

        if self.dry_run {
            let url = self.source.file_url(variable, &file_name);
            info!("{label}: DRY RUN - Would download from {url}");
            return Ok(UnitStatus::DryRun);
        }

        info!("{label}: Downloading {file_name}...");
        match self
            .source
            .fetch_file(variable, &file_name, &target, &label)
            .await
        {
            Ok(_) => {
                info!("{label}: Successfully downloaded to {}", target.display());
                Ok(UnitStatus::Completed)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!("{label}: Download failed: {e}");
                remove_partial_file(&target).await;
                Ok(UnitStatus::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadError;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Clone, Copy, PartialEq)]
    enum Outcome {
        Written,
        Interrupted,
    }

    struct FakePortal {
        listing: Option<Vec<&'static str>>,
        outcome: Outcome,
        fetched: Mutex<Vec<String>>,
    }

    impl FakePortal {
        fn new(listing: Option<Vec<&'static str>>, outcome: Outcome) -> Self {
            Self {
                listing,
                outcome,
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl OpenDataSource for FakePortal {
        async fn list_variables(&self) -> Result<BTreeSet<String>, IconDreamError> {
            match &self.listing {
                Some(listing) => Ok(listing.iter().map(|v| v.to_string()).collect()),
                None => Err(IconDreamError::Download(DownloadError::Write(
                    PathBuf::from("listing"),
                    std::io::Error::other("unreachable"),
                ))),
            }
        }

        fn file_url(&self, variable: &str, file_name: &str) -> String {
            format!("https://portal.test/{variable}/{file_name}")
        }

        async fn fetch_file(
            &self,
            variable: &str,
            file_name: &str,
            target: &Path,
            _label: &str,
        ) -> Result<u64, IconDreamError> {
            self.fetched.lock().unwrap().push(file_name.to_string());
            std::fs::write(target, b"GRIB").unwrap();
            match self.outcome {
                Outcome::Written => Ok(4),
                Outcome::Interrupted => Err(IconDreamError::Download(DownloadError::Transfer(
                    self.file_url(variable, file_name),
                    request_error(),
                ))),
            }
        }
    }

    /// A transport-level error for a request that never left the process.
    fn request_error() -> reqwest::Error {
        reqwest::Client::new().get("not a url").build().unwrap_err()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn downloader(
        portal: FakePortal,
        dir: &Path,
        dry_run: bool,
    ) -> IconDreamDownloader<FakePortal> {
        IconDreamDownloader::builder()
            .source(portal)
            .output_path(dir.to_path_buf())
            .years(vec![2020])
            .months(strings(&["01", "02"]))
            .variables(strings(&["T", "T_2M"]))
            .resume(true)
            .dry_run(dry_run)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_grid_spans_years_months_and_variables() {
        let dir = tempfile::tempdir().unwrap();
        let portal = FakePortal::new(Some(vec!["T", "T_2M", "PS"]), Outcome::Written);
        let downloader = downloader(portal, dir.path(), false).await;

        assert_eq!(downloader.grid().shape(), vec![1, 2, 2]);
        assert_eq!(downloader.available_variables().len(), 3);
    }

    #[tokio::test]
    async fn test_files_are_downloaded_and_marked_done() {
        let dir = tempfile::tempdir().unwrap();
        let portal = FakePortal::new(Some(vec!["T", "T_2M"]), Outcome::Written);
        let mut downloader = downloader(portal, dir.path(), false).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.completed, 4);
        assert_eq!(downloader.checkpoint().completed_count(), 4);
        assert_eq!(
            downloader.fetcher.source.fetched()[0],
            "ICON-DREAM-Global_202001_T_hourly.grb"
        );
        assert!(dir
            .path()
            .join("ICON-DREAM-Global_202002_T_2M_hourly.grb")
            .exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_not_fetched_again() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ICON-DREAM-Global_202001_T_hourly.grb"), b"GRIB").unwrap();
        let portal = FakePortal::new(Some(vec!["T", "T_2M"]), Outcome::Written);
        let mut downloader = downloader(portal, dir.path(), false).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.completed, 4);
        assert_eq!(downloader.fetcher.source.fetched().len(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_checkpoint_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let portal = FakePortal::new(Some(vec!["T", "T_2M"]), Outcome::Written);
        let mut downloader = downloader(portal, dir.path(), true).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.dry_run, 4);
        assert!(downloader.fetcher.source.fetched().is_empty());
        assert_eq!(downloader.checkpoint().completed_count(), 0);
        assert!(!downloader.orchestrator.store().path().exists());
    }

    #[tokio::test]
    async fn test_interrupted_transfer_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let portal = FakePortal::new(Some(vec!["T", "T_2M"]), Outcome::Interrupted);
        let mut downloader = downloader(portal, dir.path(), false).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.failed, 4);
        assert!(!dir
            .path()
            .join("ICON-DREAM-Global_202001_T_hourly.grb")
            .exists());
        assert_eq!(downloader.checkpoint().completed_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_variable_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = IconDreamDownloader::builder()
            .source(FakePortal::new(Some(vec!["T"]), Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .variables(strings(&["T", "FOO"]))
            .build()
            .await;

        let Err(err) = result else {
            panic!("expected an invalid variable error");
        };
        assert_eq!(err.to_string(), "Invalid variables: FOO. Available variables: T");
    }

    #[tokio::test]
    async fn test_listing_failure_falls_back_to_builtin_set() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = IconDreamDownloader::builder()
            .source(FakePortal::new(None, Outcome::Written))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .build()
            .await
            .unwrap();

        assert_eq!(downloader.available_variables(), &fallback_variables());
        assert_eq!(downloader.grid().shape(), vec![1, 12, 1]);
    }
}
