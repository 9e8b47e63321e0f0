use crate::checkpoint::CheckpointError;
use crate::download::DownloadError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntsoeError {
    #[error("ENTSO-E security token is empty")]
    MissingToken,

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Bidding zone '{0}' is not supported.")]
    UnsupportedZone(String),

    #[error("No bidding zones are known for country '{0}'")]
    UnknownCountry(String),

    #[error("Entso-E Transparency Platform is currently unavailable!")]
    ServiceUnavailable,

    #[error("Entso-E Transparency Platform rejected the security token ({0})")]
    Unauthorized(reqwest::StatusCode),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Failed to read reply body from {0}")]
    Body(String, #[source] reqwest::Error),

    #[error("Failed to decode ENTSO-E document")]
    Decode(#[source] quick_xml::DeError),

    #[error("ENTSO-E reply is not well-formed XML")]
    Xml(#[source] quick_xml::Error),

    #[error("Unexpected ENTSO-E document type '{0}'")]
    UnexpectedDocument(String),

    #[error("Failed to prepare output directory '{0}'")]
    OutputDir(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing CSV file '{0}'")]
    CsvWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing CSV file '{0}'")]
    CsvWritePolars(PathBuf, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl EntsoeError {
    /// Errors that must end the run instead of failing a single unit.
    pub fn is_fatal(&self) -> bool {
        match self {
            EntsoeError::Download(e) => e.is_fatal(),
            EntsoeError::Body(..)
            | EntsoeError::Decode(_)
            | EntsoeError::Xml(_)
            | EntsoeError::UnexpectedDocument(_) => false,
            _ => true,
        }
    }
}
