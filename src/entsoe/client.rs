use crate::download::{http_client, DownloadError};
use crate::entsoe::document::{parse_reply, GenerationRecord, ReplyDocument};
use crate::entsoe::error::EntsoeError;
use log::debug;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu";

/// Document type "actual generation" and process type "realised".
const DOCUMENT_TYPE: &str = "A73";
const PROCESS_TYPE: &str = "A16";

const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of one generation query.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationReply {
    /// The platform returned generation records.
    Data(Vec<GenerationRecord>),
    /// The platform confirmed there is no data for the zone and year.
    NoData,
    /// The platform answered without the requested data, for the given reason.
    Unanswered(String),
}

/// Anything able to answer "actual generation per generation unit" queries.
#[allow(async_fn_in_trait)]
pub trait GenerationSource {
    async fn actual_generation_per_unit(
        &self,
        zone: &str,
        year: i32,
    ) -> Result<GenerationReply, EntsoeError>;
}

/// Query parameters of a full-year generation request.
pub fn generation_query(zone: &str, year: i32) -> Vec<(&'static str, String)> {
    vec![
        ("documentType", DOCUMENT_TYPE.to_string()),
        ("processType", PROCESS_TYPE.to_string()),
        ("in_Domain", zone.to_string()),
        ("periodStart", format!("{year}01010000")),
        ("periodEnd", format!("{year}12312359")),
    ]
}

/// Client of the ENTSO-E transparency platform RESTful API.
#[derive(Debug, Clone)]
pub struct EntsoeClient {
    client: Client,
    token: String,
    base_url: String,
}

impl EntsoeClient {
    /// Creates a client for the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::MissingToken`] if `token` is blank.
    pub fn new(token: impl Into<String>) -> Result<Self, EntsoeError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, EntsoeError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(EntsoeError::MissingToken);
        }
        Ok(Self {
            client: http_client(READ_TIMEOUT).map_err(EntsoeError::HttpClient)?,
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl GenerationSource for EntsoeClient {
    async fn actual_generation_per_unit(
        &self,
        zone: &str,
        year: i32,
    ) -> Result<GenerationReply, EntsoeError> {
        let url = format!("{}/api", self.base_url);
        debug!("Querying {} for {} in {}", url, zone, year);

        let response = self
            .client
            .get(&url)
            .query(&[("securityToken", self.token.as_str())])
            .query(&generation_query(zone, year))
            .send()
            .await
            .map_err(|e| DownloadError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        match status {
            StatusCode::SERVICE_UNAVAILABLE => return Err(EntsoeError::ServiceUnavailable),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(EntsoeError::Unauthorized(status))
            }
            _ => {}
        }

        // Acknowledgements are delivered with 400 Bad Request.
        let response = if status == StatusCode::BAD_REQUEST {
            response
        } else {
            response
                .error_for_status()
                .map_err(|e| DownloadError::HttpStatus {
                    url: url.clone(),
                    status,
                    source: e,
                })?
        };

        let body = response
            .text()
            .await
            .map_err(|e| EntsoeError::Body(url.clone(), e))?;
        Ok(reply_from_document(parse_reply(&body)?))
    }
}

fn reply_from_document(document: ReplyDocument) -> GenerationReply {
    match document {
        ReplyDocument::Generation(document) => {
            let records = document.records();
            if records.is_empty() {
                GenerationReply::NoData
            } else {
                GenerationReply::Data(records)
            }
        }
        ReplyDocument::Acknowledgement(ack) if ack.is_no_data() => GenerationReply::NoData,
        ReplyDocument::Acknowledgement(ack) => GenerationReply::Unanswered(ack.describe()),
    }
}
