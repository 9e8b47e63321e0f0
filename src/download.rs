//! HTTP plumbing shared by the provider clients: status mapping and streaming a
//! response body to disk.

use futures_util::StreamExt;
use log::{info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const BYTES_PER_MIB: u64 = 1024 * 1024;
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Interval at which [`stream_to_file`] reports progress.
pub const PROGRESS_INTERVAL_BYTES: u64 = 100 * BYTES_PER_MIB;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Transfer from {0} was interrupted")]
    Transfer(String, #[source] reqwest::Error),

    #[error("Failed to write download target '{0}'")]
    Write(PathBuf, #[source] std::io::Error),
}

impl DownloadError {
    /// The HTTP status, if the server answered with an error status.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DownloadError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying later cannot help within this run: the provider is
    /// unavailable, rejects the credentials, or the local disk refuses the write.
    pub fn is_fatal(&self) -> bool {
        match self {
            DownloadError::HttpStatus { status, .. } => is_fatal_status(*status),
            DownloadError::Write(..) => true,
            DownloadError::NetworkRequest(..) | DownloadError::Transfer(..) => false,
        }
    }
}

pub(crate) fn is_fatal_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

/// Builds the HTTP client of a provider. A read that sees no data for `read_timeout`
/// fails the request, also in the middle of a streamed body.
pub(crate) fn http_client(read_timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(read_timeout)
        .build()
}

/// Sends `request` and turns transport failures and error statuses into [`DownloadError`].
pub async fn send_checked(request: RequestBuilder, url: &str) -> Result<Response, DownloadError> {
    let response = request
        .send()
        .await
        .map_err(|e| DownloadError::NetworkRequest(url.to_string(), e))?;

    match response.error_for_status() {
        Ok(resp) => Ok(resp),
        Err(e) => {
            warn!("HTTP error for {}: {:?}", url, e);
            Err(if let Some(status) = e.status() {
                DownloadError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                }
            } else {
                DownloadError::NetworkRequest(url.to_string(), e)
            })
        }
    }
}

/// Streams the body of `response` into `target`.
///
/// The body is written to `<target>.part` and only renamed to `target` once the
/// transfer is complete, so an existing `target` always holds a whole file. On any
/// error the partial file is removed. Progress is logged every
/// [`PROGRESS_INTERVAL_BYTES`], prefixed by `label`.
///
/// Returns the number of bytes written.
pub async fn stream_to_file(
    response: Response,
    url: &str,
    target: &Path,
    label: &str,
) -> Result<u64, DownloadError> {
    let part = partial_path(target);
    let written = match write_body(response, url, &part, label).await {
        Ok(written) => written,
        Err(e) => {
            remove_partial_file(&part).await;
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&part, target).await {
        remove_partial_file(&part).await;
        return Err(DownloadError::Write(target.to_path_buf(), e));
    }
    Ok(written)
}

async fn write_body(
    response: Response,
    url: &str,
    part: &Path,
    label: &str,
) -> Result<u64, DownloadError> {
    let total = response.content_length().unwrap_or(0);
    let total_gib = total as f64 / BYTES_PER_GIB;
    info!("{label}: File size: {total_gib:.2} GB");

    let mut file = fs::File::create(part)
        .await
        .map_err(|e| DownloadError::Write(part.to_path_buf(), e))?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Transfer(url.to_string(), e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::Write(part.to_path_buf(), e))?;

        let before = written;
        written += chunk.len() as u64;
        if written / PROGRESS_INTERVAL_BYTES > before / PROGRESS_INTERVAL_BYTES {
            let progress = if total > 0 {
                written as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            info!(
                "{label}: Downloaded {:.2}GB / {total_gib:.2}GB ({progress:.1}%)",
                written as f64 / BYTES_PER_GIB
            );
        }
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::Write(part.to_path_buf(), e))?;
    Ok(written)
}

/// Path `stream_to_file` writes to before the transfer completes.
pub(crate) fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

/// Removes a partially written file, if any. Failures are only logged.
pub async fn remove_partial_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => info!("Removed partial file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", path.display(), e),
    }
}
