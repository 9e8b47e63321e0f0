//! The resumable download loop shared by every provider.
//!
//! An [`Orchestrator`] walks a [`WorkGrid`] in its fixed row-major order, skips
//! units the [`Checkpoint`] already marks as done, hands every other unit to a
//! [`UnitDownloader`] and persists the checkpoint after each attempt. Units are
//! processed strictly one after another; the next unit only starts once the
//! previous one has been awaited to completion.

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointStore, Unit, WorkGrid};
use log::info;
use std::fmt;

/// Outcome of a single unit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    /// The artifact was written, or was already present locally.
    Completed,
    /// The provider confirmed there is nothing to download for this unit.
    Empty,
    /// A recoverable error occurred; the unit is retried on the next run.
    Failed,
    /// The request was only reported. The checkpoint is left untouched.
    DryRun,
}

impl UnitStatus {
    /// Whether the checkpoint cell should be set to 1 for this outcome.
    pub fn is_done(self) -> bool {
        matches!(self, UnitStatus::Completed | UnitStatus::Empty)
    }
}

/// Performs the externally visible work of one unit.
///
/// Implementations log and downgrade recoverable provider errors to
/// [`UnitStatus::Failed`] and only return `Err` for errors that must end the run.
#[allow(async_fn_in_trait)]
pub trait UnitDownloader {
    type Error: From<CheckpointError>;

    async fn download_unit(&mut self, unit: &Unit) -> Result<UnitStatus, Self::Error>;

    /// Prefix used for log lines about `unit`.
    fn label(&self, unit: &Unit) -> String {
        unit.to_string()
    }
}

/// Per-status counters of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub empty: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dry_run: usize,
}

impl RunSummary {
    /// Number of units handed to the downloader.
    pub fn attempted(&self) -> usize {
        self.completed + self.empty + self.failed + self.dry_run
    }

    fn record(&mut self, status: UnitStatus) {
        match status {
            UnitStatus::Completed => self.completed += 1,
            UnitStatus::Empty => self.empty += 1,
            UnitStatus::Failed => self.failed += 1,
            UnitStatus::DryRun => self.dry_run += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} empty, {} failed, {} skipped, {} dry-run",
            self.completed, self.empty, self.failed, self.skipped, self.dry_run
        )
    }
}

/// Owns a grid together with its checkpoint and drives a [`UnitDownloader`] over it.
#[derive(Debug)]
pub struct Orchestrator {
    grid: WorkGrid,
    store: CheckpointStore,
    checkpoint: Checkpoint,
}

impl Orchestrator {
    /// Loads (or freshly creates) the checkpoint for `grid`.
    ///
    /// # Errors
    ///
    /// Propagates [`CheckpointStore::load`] errors, e.g. a checkpoint written for another grid.
    pub fn new(
        grid: WorkGrid,
        store: CheckpointStore,
        resume: bool,
    ) -> Result<Self, CheckpointError> {
        let checkpoint = store.load(&grid, resume)?;
        Ok(Self {
            grid,
            store,
            checkpoint,
        })
    }

    pub fn grid(&self) -> &WorkGrid {
        &self.grid
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Runs `downloader` over every unit that is not yet done.
    ///
    /// After each attempt other than a dry run the unit's cell is set from the returned
    /// status and the checkpoint is saved, so a run aborted by an error keeps everything
    /// completed before it.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of `downloader`, or a checkpoint error if the
    /// checkpoint cannot be updated or saved.
    pub async fn run<D: UnitDownloader>(
        &mut self,
        downloader: &mut D,
    ) -> Result<RunSummary, D::Error> {
        let mut summary = RunSummary::default();
        let outer = self.grid.dimensions().first().map(|d| d.name().to_string());
        let mut current_outer: Option<usize> = None;

        for unit in self.grid.units() {
            if let Some(name) = &outer {
                let index = unit.index(name);
                if index != current_outer {
                    current_outer = index;
                    if let Some(key) = unit.key(name) {
                        info!("Going through {name} {key}...");
                    }
                }
            }

            if self.checkpoint.is_done(unit.coord()) {
                info!("{}: Data previously downloaded.", downloader.label(&unit));
                summary.skipped += 1;
                continue;
            }

            let status = downloader.download_unit(&unit).await?;
            summary.record(status);
            if status == UnitStatus::DryRun {
                continue;
            }

            self.checkpoint.mark(unit.coord(), status.is_done())?;
            self.store.save(&self.checkpoint)?;
        }

        info!("All downloads processed: {summary}.");
        Ok(summary)
    }
}
