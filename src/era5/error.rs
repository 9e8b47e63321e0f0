use crate::checkpoint::CheckpointError;
use crate::download::DownloadError;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors of the Climate Data Store retrieve API.
#[derive(Debug, Error)]
pub enum CdsError {
    #[error("CDS API key is empty")]
    MissingKey,

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("CDS API is currently unavailable!")]
    ServiceUnavailable,

    #[error("CDS API rejected the API key ({0})")]
    Unauthorized(StatusCode),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Failed to decode CDS response from {0}")]
    Decode(String, #[source] reqwest::Error),

    #[error("CDS job {job_id} ended with status '{status}'")]
    JobFailed { job_id: String, status: String },

    #[error("CDS job {0} finished without a downloadable asset")]
    MissingAsset(String),
}

impl CdsError {
    pub fn is_fatal(&self) -> bool {
        match self {
            CdsError::MissingKey
            | CdsError::HttpClient(_)
            | CdsError::ServiceUnavailable
            | CdsError::Unauthorized(_) => true,
            CdsError::Download(e) => e.is_fatal(),
            CdsError::Decode(..) | CdsError::JobFailed { .. } | CdsError::MissingAsset(_) => {
                false
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Era5Error {
    #[error("file_format must be 'grib' or 'netcdf', got '{0}'")]
    InvalidFileFormat(String),

    #[error("Invalid month '{0}', expected 01-12")]
    InvalidMonth(String),

    #[error("{0}")]
    InvalidVariables(String),

    #[error("Invalid {level_type} levels: {levels}")]
    InvalidLevels { level_type: String, levels: String },

    #[error("Single-level-only downloads cannot be combined with pressure or model levels")]
    ConflictingLevels,

    #[error("Failed to prepare output directory '{0}'")]
    OutputDir(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Cds(#[from] CdsError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
