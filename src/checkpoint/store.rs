//! Persisted completion state of a work grid.
//!
//! The checkpoint is logically a {0, 1} matrix with one axis per grid dimension. It is
//! stored sparsely as the set of completed coordinates, together with the dimensions it
//! was created for, so a file written for one grid can never be read back against a
//! different one.

use crate::checkpoint::error::CheckpointError;
use crate::checkpoint::grid::{describe_dimensions, Dimension, WorkGrid};
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the checkpoint inside a downloader's output directory.
pub const CHECKPOINT_FILE_NAME: &str = "status.pickle";

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Completion flags for every unit of a [`WorkGrid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    dimensions: Vec<Dimension>,
    completed: BTreeSet<Vec<usize>>,
}

impl Checkpoint {
    /// An all-zero checkpoint shaped like `grid`.
    pub fn fresh(grid: &WorkGrid) -> Self {
        Self {
            dimensions: grid.dimensions().to_vec(),
            completed: BTreeSet::new(),
        }
    }

    /// Whether this checkpoint was created for exactly this grid.
    pub fn matches(&self, grid: &WorkGrid) -> bool {
        self.dimensions == grid.dimensions()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::len).collect()
    }

    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    fn contains(&self, coord: &[usize]) -> bool {
        coord.len() == self.ndim()
            && coord
                .iter()
                .zip(&self.dimensions)
                .all(|(&i, dimension)| i < dimension.len())
    }

    /// Cell value at `coord`: 1 when completed, 0 otherwise (including out of range).
    pub fn get(&self, coord: &[usize]) -> u8 {
        u8::from(self.completed.contains(coord))
    }

    pub fn is_done(&self, coord: &[usize]) -> bool {
        self.get(coord) != 0
    }

    /// Sets the cell at `coord` to 1 (`done`) or back to 0.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::OutOfBounds`] if `coord` does not address a cell.
    pub fn mark(&mut self, coord: &[usize], done: bool) -> Result<(), CheckpointError> {
        if !self.contains(coord) {
            return Err(CheckpointError::OutOfBounds {
                coord: coord.to_vec(),
                shape: self.shape(),
            });
        }
        if done {
            self.completed.insert(coord.to_vec());
        } else {
            self.completed.remove(coord);
        }
        Ok(())
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Row-major dense view of the matrix.
    pub fn to_dense(&self) -> Vec<u8> {
        let shape = self.shape();
        let total: usize = shape.iter().product();
        let mut dense = vec![0u8; total];
        for coord in &self.completed {
            let flat = coord
                .iter()
                .zip(&shape)
                .fold(0usize, |acc, (&i, &len)| acc * len + i);
            dense[flat] = 1;
        }
        dense
    }
}

/// Reads and writes the checkpoint file of one output directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Store for `<output_dir>/status.pickle`.
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(CHECKPOINT_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the checkpoint for `grid`.
    ///
    /// Falls back to a fresh all-zero checkpoint when `resume` is false or no file exists yet.
    ///
    /// # Errors
    ///
    /// * [`CheckpointError::Read`] / [`CheckpointError::Decode`] if an existing file cannot be read.
    /// * [`CheckpointError::GridMismatch`] if the file belongs to a grid with different dimensions.
    pub fn load(&self, grid: &WorkGrid, resume: bool) -> Result<Checkpoint, CheckpointError> {
        if !resume || !self.path.is_file() {
            info!("Starting fresh download (no checkpoint loaded).");
            return Ok(Checkpoint::fresh(grid));
        }

        let bytes =
            std::fs::read(&self.path).map_err(|e| CheckpointError::Read(self.path.clone(), e))?;
        let (checkpoint, _) =
            bincode::serde::decode_from_slice::<Checkpoint, _>(&bytes, BINCODE_CONFIG)
                .map_err(|e| CheckpointError::Decode(self.path.clone(), Box::new(e)))?;

        if !checkpoint.matches(grid) {
            return Err(CheckpointError::GridMismatch {
                path: self.path.clone(),
                expected: grid.to_string(),
                found: describe_dimensions(&checkpoint.dimensions),
            });
        }

        info!(
            "Resuming from checkpoint {} ({} of {} units done).",
            self.path.display(),
            checkpoint.completed_count(),
            grid.len()
        );
        Ok(checkpoint)
    }

    /// Writes the checkpoint through a temporary file that replaces the previous one.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| CheckpointError::DirCreation(dir.clone(), e))?;

        let bytes = bincode::serde::encode_to_vec(checkpoint, BINCODE_CONFIG)
            .map_err(|e| CheckpointError::Encode(Box::new(e)))?;

        let mut temp_file =
            NamedTempFile::new_in(&dir).map_err(|e| CheckpointError::Write(dir.clone(), e))?;
        temp_file
            .write_all(&bytes)
            .and_then(|_| temp_file.flush())
            .map_err(|e| CheckpointError::Write(self.path.clone(), e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| CheckpointError::Persist(self.path.clone(), e))?;
        Ok(())
    }
}
