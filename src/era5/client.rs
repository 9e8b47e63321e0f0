//! Client of the Copernicus Climate Data Store retrieve API.
//!
//! A retrieval is an asynchronous job: the request is submitted, the job is polled until
//! it reaches a final state, and the resulting asset is streamed to disk.

use crate::download::{http_client, send_checked, stream_to_file, DownloadError};
use crate::era5::error::CdsError;
use crate::era5::request::MarsRequest;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CDS_URL: &str = crate::config::DEFAULT_CDS_API_URL;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(120);
const API_TIMEOUT: Duration = Duration::from_secs(60);
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Anything able to retrieve a MARS request of a dataset into a local file.
#[allow(async_fn_in_trait)]
pub trait Retrieve {
    /// Retrieves `request` into `target` and returns the number of bytes written.
    async fn retrieve(
        &self,
        dataset: &str,
        request: &MarsRequest,
        target: &Path,
    ) -> Result<u64, CdsError>;
}

#[derive(Debug, Serialize)]
struct Execution<'a> {
    inputs: &'a MarsRequest,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    #[serde(rename = "jobID")]
    job_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct JobResults {
    asset: Option<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    value: AssetValue,
}

#[derive(Debug, Deserialize)]
struct AssetValue {
    href: String,
}

#[derive(Debug, Clone)]
pub struct CdsClient {
    client: Client,
    url: String,
    key: String,
    poll_interval: Duration,
}

impl CdsClient {
    /// Creates a client for the API at `url` (see [`DEFAULT_CDS_URL`]).
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::MissingKey`] if `key` is blank.
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self, CdsError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CdsError::MissingKey);
        }
        Ok(Self {
            client: http_client(READ_TIMEOUT).map_err(CdsError::HttpClient)?,
            url: url.into().trim_end_matches('/').to_string(),
            key,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Sets the first delay between two job polls. The delay doubles after every poll,
    /// up to two minutes.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(TOKEN_HEADER, &self.key)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, CdsError> {
        send_checked(self.authorized(request), url)
            .await
            .map_err(map_status)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CdsError> {
        let response = self
            .send(self.client.get(url).timeout(API_TIMEOUT), url)
            .await?;
        response
            .json()
            .await
            .map_err(|e| CdsError::Decode(url.to_string(), e))
    }

    async fn submit(&self, dataset: &str, request: &MarsRequest) -> Result<JobStatus, CdsError> {
        let url = format!("{}/retrieve/v1/processes/{dataset}/execution", self.url);
        let response = self
            .send(
                self.client
                    .post(&url)
                    .timeout(API_TIMEOUT)
                    .json(&Execution { inputs: request }),
                &url,
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| CdsError::Decode(url, e))
    }

    /// Polls the job until it is successful. Failed, rejected and dismissed jobs end in
    /// [`CdsError::JobFailed`].
    async fn wait_for(&self, mut job: JobStatus) -> Result<String, CdsError> {
        let url = format!("{}/retrieve/v1/jobs/{}", self.url, job.job_id);
        let mut delay = self.poll_interval;
        let mut last_status = String::new();

        loop {
            if job.status != last_status {
                info!("Request {} is {}", job.job_id, job.status);
                last_status = job.status.clone();
            }
            match job.status.as_str() {
                "successful" => return Ok(job.job_id),
                "accepted" | "running" => {}
                _ => {
                    return Err(CdsError::JobFailed {
                        job_id: job.job_id,
                        status: job.status,
                    })
                }
            }

            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_POLL_INTERVAL);
            job = self.get_json(&url).await?;
        }
    }
}

fn map_status(error: DownloadError) -> CdsError {
    match error.status() {
        Some(StatusCode::SERVICE_UNAVAILABLE) => CdsError::ServiceUnavailable,
        Some(status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)) => {
            CdsError::Unauthorized(status)
        }
        _ => CdsError::Download(error),
    }
}

impl Retrieve for CdsClient {
    async fn retrieve(
        &self,
        dataset: &str,
        request: &MarsRequest,
        target: &Path,
    ) -> Result<u64, CdsError> {
        let job = self.submit(dataset, request).await?;
        let job_id = self.wait_for(job).await?;

        let results_url = format!("{}/retrieve/v1/jobs/{job_id}/results", self.url);
        let results: JobResults = self.get_json(&results_url).await?;
        let href = results
            .asset
            .map(|a| a.value.href)
            .ok_or_else(|| CdsError::MissingAsset(job_id.clone()))?;

        debug!("Downloading {} to {}", href, target.display());
        let response = self.send(self.client.get(&href), &href).await?;
        let label = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| job_id.clone());
        Ok(stream_to_file(response, &href, target, &label).await?)
    }
}
