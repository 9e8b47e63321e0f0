use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;
use crate::download::DownloadError;
use crate::entsoe::EntsoeError;
use crate::era5::{CdsError, Era5Error};
use crate::icon_dream::IconDreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RbcError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Entsoe(#[from] EntsoeError),

    #[error(transparent)]
    Era5(#[from] Era5Error),

    #[error(transparent)]
    Cds(#[from] CdsError),

    #[error(transparent)]
    IconDream(#[from] IconDreamError),
}

impl RbcError {
    /// Whether the error ends a run instead of failing a single unit.
    pub fn is_fatal(&self) -> bool {
        match self {
            RbcError::Download(e) => e.is_fatal(),
            RbcError::Entsoe(e) => e.is_fatal(),
            RbcError::Cds(e) => e.is_fatal(),
            RbcError::IconDream(e) => e.is_fatal(),
            RbcError::Config(_) | RbcError::Checkpoint(_) | RbcError::Era5(_) => true,
        }
    }
}
