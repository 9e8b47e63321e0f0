//! Resumable download of ENTSO-E actual generation per generation unit.
//!
//! The work grid is `year × bidding zone`. Every unit is one full-year query for one
//! zone, written to `<output>/<zone>/<year>.csv`.

use crate::checkpoint::{Checkpoint, CheckpointStore, Dimension, Unit, WorkGrid};
use crate::entsoe::client::{generation_query, GenerationReply, GenerationSource};
use crate::entsoe::document::GenerationRecord;
use crate::entsoe::error::EntsoeError;
use crate::entsoe::mappings::{all_zone_codes, bidding_zone, psr_type_name};
use crate::orchestrator::{Orchestrator, RunSummary, UnitDownloader, UnitStatus};
use crate::utils::ensure_dir_exists;
use bon::bon;
use log::{error, info, warn};
use polars::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

const YEAR: &str = "year";
const ZONE: &str = "zone";

/// Downloads generation data for every (year, bidding zone) pair that is not yet done.
pub struct EntsoeDownloader<S> {
    orchestrator: Orchestrator,
    fetcher: GenerationFetcher<S>,
}

struct GenerationFetcher<S> {
    source: S,
    output_path: PathBuf,
    dry_run: bool,
}

#[bon]
impl<S: GenerationSource> EntsoeDownloader<S> {
    /// Prepares a download run.
    ///
    /// # Arguments
    ///
    /// * `.source(S)`: **Required.** The generation data source, usually an [`crate::EntsoeClient`].
    /// * `.output_path(PathBuf)`: **Required.** Directory for the CSV files and the checkpoint.
    /// * `.years(Vec<i32>)`: **Required.** Years to download.
    /// * `.bidding_zones(Vec<String>)`: EIC codes of the zones to download. Defaults to all known zones.
    /// * `.resume(bool)`: Continue from an existing checkpoint. Defaults to `false`.
    /// * `.dry_run(bool)`: Only log the queries. Defaults to `false`.
    ///
    /// # Errors
    ///
    /// * [`EntsoeError::UnsupportedZone`] for an unknown bidding zone.
    /// * [`EntsoeError::OutputDir`] if the output directory cannot be created.
    /// * [`EntsoeError::Checkpoint`] for duplicate years/zones or an incompatible checkpoint.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rbc_download::{EntsoeClient, EntsoeDownloader};
    /// use std::path::PathBuf;
    ///
    /// # async fn run() -> Result<(), rbc_download::EntsoeError> {
    /// let mut downloader = EntsoeDownloader::builder()
    ///     .source(EntsoeClient::new("my-token")?)
    ///     .output_path(PathBuf::from("data/entsoe"))
    ///     .years(vec![2020])
    ///     .bidding_zones(vec!["10YES-REE------0".to_string()])
    ///     .resume(true)
    ///     .build()
    ///     .await?;
    /// let summary = downloader.download_data().await?;
    /// println!("{summary}");
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn new(
        source: S,
        output_path: PathBuf,
        years: Vec<i32>,
        bidding_zones: Option<Vec<String>>,
        #[builder(default)] resume: bool,
        #[builder(default)] dry_run: bool,
    ) -> Result<Self, EntsoeError> {
        let bidding_zones = bidding_zones
            .unwrap_or_else(|| all_zone_codes().into_iter().map(String::from).collect());
        if let Some(unsupported) = bidding_zones.iter().find(|z| bidding_zone(z).is_none()) {
            return Err(EntsoeError::UnsupportedZone(unsupported.clone()));
        }

        ensure_dir_exists(&output_path)
            .await
            .map_err(|e| EntsoeError::OutputDir(output_path.clone(), e))?;

        let dry_run_note = if dry_run { " [DRY RUN - NO DATA WILL BE DOWNLOADED]" } else { "" };
        info!(
            "Entso-E Downloader initialised for:{}\n- years:\t\t{:?}\n- bidding zones:\t{:?}",
            dry_run_note, years, bidding_zones
        );

        let grid = WorkGrid::new(vec![
            Dimension::new(YEAR, &years),
            Dimension::new(ZONE, &bidding_zones),
        ])?;
        let orchestrator =
            Orchestrator::new(grid, CheckpointStore::in_dir(&output_path), resume)?;

        Ok(Self {
            orchestrator,
            fetcher: GenerationFetcher {
                source,
                output_path,
                dry_run,
            },
        })
    }

    /// Downloads every pending (year, zone) unit and dumps it to CSV.
    pub async fn download_data(&mut self) -> Result<RunSummary, EntsoeError> {
        self.orchestrator.run(&mut self.fetcher).await
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        self.orchestrator.checkpoint()
    }

    pub fn grid(&self) -> &WorkGrid {
        self.orchestrator.grid()
    }
}

impl<S: GenerationSource> UnitDownloader for GenerationFetcher<S> {
    type Error = EntsoeError;

    fn label(&self, unit: &Unit) -> String {
        match (unit.key(ZONE), unit.key(YEAR)) {
            (Some(zone), Some(year)) => format!("{zone} in {year}"),
            _ => unit.to_string(),
        }
    }

    async fn download_unit(&mut self, unit: &Unit) -> Result<UnitStatus, EntsoeError> {
        let label = self.label(unit);
        let zone = unit.require_key(ZONE)?;
        let year: i32 = unit.parse_key(YEAR)?;

        if self.dry_run {
            println!("DRY RUN: {label}");
            for (key, value) in generation_query(zone, year) {
                println!("  {key}: {value}");
            }
            info!("{label}: DRY RUN - Query printed (not submitted)");
            return Ok(UnitStatus::DryRun);
        }

        let reply = match self.source.actual_generation_per_unit(zone, year).await {
            Ok(reply) => reply,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("{label}: Query failed: {e}");
                return Ok(UnitStatus::Failed);
            }
        };

        let records = match reply {
            GenerationReply::Unanswered(reason) => {
                warn!("{label}: API call did not return requested data! {reason}");
                return Ok(UnitStatus::Failed);
            }
            GenerationReply::NoData => {
                warn!("{label}: No data available! Setting download status to 1.");
                return Ok(UnitStatus::Empty);
            }
            GenerationReply::Data(records) => records,
        };

        let Some(rows) = GenerationRows::from_records(&records) else {
            warn!("{label}: Relevant data missing!");
            return Ok(UnitStatus::Failed);
        };

        let path = self.output_path.join(zone).join(format!("{year}.csv"));
        write_csv(rows, &path).await?;
        info!("{label}: Data downloaded and saved.");
        Ok(UnitStatus::Completed)
    }
}

/// Column-wise CSV rows with PSR codes already translated to production type names.
/// Missing values become empty CSV cells.
#[derive(Debug, Default)]
struct GenerationRows {
    production_type: Vec<String>,
    plant_name: Vec<Option<String>>,
    quantity: Vec<Option<f64>>,
    unit: Vec<Option<String>>,
    timestamp: Vec<Option<String>>,
}

impl GenerationRows {
    /// Returns `None` if a relevant field is absent from every record. Records without a
    /// production type, or with one outside the known PSR codes, are dropped.
    fn from_records(records: &[GenerationRecord]) -> Option<Self> {
        let has_column = |present: fn(&GenerationRecord) -> bool| records.iter().any(present);
        if !(has_column(|r| r.psr_type.is_some())
            && has_column(|r| r.plant_name.is_some())
            && has_column(|r| r.quantity.is_some())
            && has_column(|r| r.unit.is_some())
            && has_column(|r| r.timestamp.is_some()))
        {
            return None;
        }

        let mut rows = Self::default();
        for record in records {
            let Some(production_type) = record.psr_type.as_deref().and_then(psr_type_name)
            else {
                continue;
            };
            rows.production_type.push(production_type.to_string());
            rows.plant_name.push(record.plant_name.clone());
            rows.quantity.push(record.quantity);
            rows.unit.push(record.unit.clone());
            rows.timestamp.push(
                record
                    .timestamp
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S%:z").to_string()),
            );
        }
        Some(rows)
    }

    fn into_frame(self) -> PolarsResult<DataFrame> {
        df!(
            "production_type" => self.production_type,
            "plant_name" => self.plant_name,
            "quantity" => self.quantity,
            "unit" => self.unit,
            "timestamp" => self.timestamp
        )
    }
}

/// Writes the rows to `path` through a temporary file in the same directory.
async fn write_csv(rows: GenerationRows, path: &Path) -> Result<(), EntsoeError> {
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let dir = path_buf
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir).map_err(|e| EntsoeError::OutputDir(dir.clone(), e))?;

        let mut df = rows
            .into_frame()
            .map_err(|e| EntsoeError::CsvWritePolars(path_buf.clone(), e))?;
        let mut temp_file = NamedTempFile::new_in(&dir)
            .map_err(|e| EntsoeError::CsvWriteIo(path_buf.clone(), e))?;
        CsvWriter::new(&mut temp_file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| EntsoeError::CsvWritePolars(path_buf.clone(), e))?;
        temp_file
            .flush()
            .map_err(|e| EntsoeError::CsvWriteIo(path_buf.clone(), e))?;
        temp_file
            .persist(&path_buf)
            .map_err(|e| EntsoeError::CsvWriteIo(path_buf.clone(), e.error))?;
        info!("Successfully wrote dataframe to '{}'", path_buf.display());
        Ok(())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entsoe::document::tests::BIOMASS_REPLY;
    use crate::entsoe::document::{parse_reply, ReplyDocument};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SPAIN: &str = "10YES-REE------0";

    enum Script {
        Reply(GenerationReply),
        Unavailable,
    }

    struct FakeSource {
        script: Script,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn replying(reply: GenerationReply) -> Self {
            Self {
                script: Script::Reply(reply),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GenerationSource for FakeSource {
        async fn actual_generation_per_unit(
            &self,
            _zone: &str,
            _year: i32,
        ) -> Result<GenerationReply, EntsoeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Reply(reply) => Ok(reply.clone()),
                Script::Unavailable => Err(EntsoeError::ServiceUnavailable),
            }
        }
    }

    fn record(psr_type: &str) -> GenerationRecord {
        GenerationRecord {
            psr_type: Some(psr_type.to_string()),
            plant_name: Some("Central Biomasa Huelva".to_string()),
            quantity: Some(41.5),
            unit: Some("MAW".to_string()),
            timestamp: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    async fn downloader(source: FakeSource, dir: &Path) -> EntsoeDownloader<FakeSource> {
        EntsoeDownloader::builder()
            .source(source)
            .output_path(dir.to_path_buf())
            .years(vec![2020])
            .bidding_zones(vec![SPAIN.to_string()])
            .resume(true)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_biomass_record_is_written_and_marked_done() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::replying(GenerationReply::Data(vec![record("B01")]));
        let mut downloader = downloader(source, dir.path()).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.completed, 1);

        let csv = std::fs::read_to_string(dir.path().join(SPAIN).join("2020.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("production_type,plant_name,quantity,unit,timestamp")
        );
        let row = lines.next().unwrap();
        assert_eq!(row.split(',').next(), Some("Biomass"));

        let checkpoint = CheckpointStore::in_dir(dir.path())
            .load(downloader.grid(), true)
            .unwrap();
        assert_eq!(checkpoint.get(&[0, 0]), 1);
    }

    #[tokio::test]
    async fn test_no_data_marks_unit_done_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader =
            downloader(FakeSource::replying(GenerationReply::NoData), dir.path()).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.empty, 1);
        assert!(downloader.checkpoint().is_done(&[0, 0]));
        assert!(!dir.path().join(SPAIN).join("2020.csv").exists());
    }

    #[tokio::test]
    async fn test_unanswered_query_is_retried_later() {
        let dir = tempfile::tempdir().unwrap();
        let reply = GenerationReply::Unanswered("Too many requests (B11)".to_string());
        let mut downloader = downloader(FakeSource::replying(reply), dir.path()).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(!downloader.checkpoint().is_done(&[0, 0]));
    }

    #[tokio::test]
    async fn test_field_missing_from_every_record_fails_the_unit() {
        let dir = tempfile::tempdir().unwrap();
        let mut incomplete = record("B01");
        incomplete.plant_name = None;
        let source = FakeSource::replying(GenerationReply::Data(vec![incomplete]));
        let mut downloader = downloader(source, dir.path()).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(!dir.path().join(SPAIN).join("2020.csv").exists());
    }

    #[tokio::test]
    async fn test_series_without_plant_name_keeps_an_empty_cell() {
        let dir = tempfile::tempdir().unwrap();
        let mut nameless = record("B16");
        nameless.plant_name = None;
        let source = FakeSource::replying(GenerationReply::Data(vec![record("B01"), nameless]));
        let mut downloader = downloader(source, dir.path()).await;

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.completed, 1);

        let csv = std::fs::read_to_string(dir.path().join(SPAIN).join("2020.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Biomass,Central Biomasa Huelva,41.5,MAW,"));
        assert!(lines[2].starts_with("Solar,,41.5,MAW,"));
    }

    #[test]
    fn test_rows_from_document_with_a_nameless_series() {
        let solar = r#"<TimeSeries>
        <mRID>2</mRID>
        <quantity_Measure_Unit.name>MAW</quantity_Measure_Unit.name>
        <MktPSRType>
            <psrType>B16</psrType>
        </MktPSRType>
        <Period>
            <timeInterval>
                <start>2020-01-01T00:00Z</start>
                <end>2020-01-01T01:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point>
                <position>1</position>
                <quantity>12</quantity>
            </Point>
        </Period>
    </TimeSeries>
</GL_MarketDocument>"#;
        let xml = BIOMASS_REPLY.replace("</GL_MarketDocument>", solar);
        let ReplyDocument::Generation(document) = parse_reply(&xml).unwrap() else {
            panic!("expected a generation document");
        };

        let rows = GenerationRows::from_records(&document.records()).unwrap();
        assert_eq!(rows.production_type, vec!["Biomass", "Biomass", "Solar"]);
        assert_eq!(rows.plant_name[2], None);
        assert_eq!(rows.quantity[2], Some(12.0));
    }

    #[tokio::test]
    async fn test_unmapped_production_types_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            FakeSource::replying(GenerationReply::Data(vec![record("A05"), record("B16")]));
        let mut downloader = downloader(source, dir.path()).await;
        downloader.download_data().await.unwrap();

        let csv = std::fs::read_to_string(dir.path().join(SPAIN).join("2020.csv")).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("Solar"));
    }

    #[tokio::test]
    async fn test_unavailable_platform_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource {
            script: Script::Unavailable,
            calls: AtomicUsize::new(0),
        };
        let mut downloader = downloader(source, dir.path()).await;

        let err = downloader.download_data().await.unwrap_err();
        assert!(matches!(err, EntsoeError::ServiceUnavailable));
        assert!(!downloader.checkpoint().is_done(&[0, 0]));
    }

    #[tokio::test]
    async fn test_dry_run_never_queries() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = EntsoeDownloader::builder()
            .source(FakeSource::replying(GenerationReply::NoData))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020, 2021])
            .bidding_zones(vec![SPAIN.to_string()])
            .dry_run(true)
            .build()
            .await
            .unwrap();

        let summary = downloader.download_data().await.unwrap();
        assert_eq!(summary.dry_run, 2);
        assert_eq!(downloader.fetcher.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(downloader.checkpoint().completed_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_zone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = EntsoeDownloader::builder()
            .source(FakeSource::replying(GenerationReply::NoData))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .bidding_zones(vec!["10YXX-NOWHERE--0".to_string()])
            .build()
            .await;

        let Err(err) = result else {
            panic!("expected an unsupported zone error");
        };
        assert_eq!(err.to_string(), "Bidding zone '10YXX-NOWHERE--0' is not supported.");
    }

    #[tokio::test]
    async fn test_default_zones_span_the_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = EntsoeDownloader::builder()
            .source(FakeSource::replying(GenerationReply::NoData))
            .output_path(dir.path().to_path_buf())
            .years(vec![2020])
            .build()
            .await
            .unwrap();

        assert_eq!(downloader.grid().shape(), vec![1, all_zone_codes().len()]);
    }
}
