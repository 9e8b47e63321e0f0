pub mod client;
pub mod document;
pub mod downloader;
pub mod error;
pub mod mappings;

pub use client::{EntsoeClient, GenerationReply, GenerationSource};
pub use document::GenerationRecord;
pub use downloader::EntsoeDownloader;
pub use error::EntsoeError;
pub use mappings::{all_zone_codes, zones_for_country, BiddingZone, BIDDING_ZONES};
