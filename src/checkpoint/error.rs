use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Dimension '{dimension}' lists key '{key}' more than once")]
    DuplicateKey { dimension: String, key: String },

    #[error("Unit ({unit}) has no '{dimension}' dimension")]
    MissingDimension { dimension: String, unit: String },

    #[error("Key '{key}' of dimension '{dimension}' cannot be parsed")]
    InvalidKey { dimension: String, key: String },

    #[error("Coordinate {coord:?} is outside the checkpoint shape {shape:?}")]
    OutOfBounds {
        coord: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Failed to read checkpoint file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write checkpoint file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to replace checkpoint file '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("Failed to create checkpoint directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode checkpoint data from '{0}'")]
    Decode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode checkpoint data")]
    Encode(#[source] Box<bincode::error::EncodeError>),

    #[error(
        "Checkpoint '{path}' was written for grid {found} but the current grid is {expected}; \
         remove it or run without --resume"
    )]
    GridMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}
