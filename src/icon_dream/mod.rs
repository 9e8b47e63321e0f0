pub mod catalogue;
pub mod client;
pub mod downloader;
pub mod error;

pub use catalogue::{fallback_variables, variables_report};
pub use client::{file_name, DwdClient, OpenDataSource, DEFAULT_BASE_URL};
pub use downloader::{discover_variables, IconDreamDownloader};
pub use error::IconDreamError;
