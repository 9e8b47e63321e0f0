use crate::checkpoint::CheckpointError;
use crate::download::DownloadError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IconDreamError {
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Failed to read directory listing from {0}")]
    Listing(String, #[source] reqwest::Error),

    #[error("Invalid variables: {invalid}. Available variables: {available}")]
    InvalidVariables { invalid: String, available: String },

    #[error("Invalid month '{0}', expected 01-12")]
    InvalidMonth(String),

    #[error("Failed to prepare output directory '{0}'")]
    OutputDir(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl IconDreamError {
    /// Whether the run has to stop. Transfer problems of a single file are not fatal
    /// unless the portal is unavailable or the file cannot be written locally.
    pub fn is_fatal(&self) -> bool {
        match self {
            IconDreamError::Download(e) => e.is_fatal(),
            IconDreamError::Listing(..) => false,
            _ => true,
        }
    }
}
