pub mod client;
pub mod downloader;
pub mod error;
pub mod mappings;
pub mod request;

pub use client::{CdsClient, Retrieve, DEFAULT_CDS_URL};
pub use downloader::{Era5Downloader, DEFAULT_RESOLUTION};
pub use error::{CdsError, Era5Error};
pub use mappings::{available_variables_report, mars_param, LevelType};
pub use request::{FileFormat, MarsRequest, DATASET};
