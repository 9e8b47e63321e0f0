use crate::download::{http_client, send_checked, stream_to_file};
use crate::icon_dream::catalogue::parse_listing;
use crate::icon_dream::error::IconDreamError;
use log::debug;
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str =
    "https://opendata.dwd.de/climate_environment/REA/ICON-DREAM-Global/hourly";

const LISTING_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Name of the hourly file of `variable` for `year`-`month`.
pub fn file_name(year: i32, month: &str, variable: &str) -> String {
    format!("ICON-DREAM-Global_{year}{month}_{variable}_hourly.grb")
}

/// Read access to the DWD open-data tree.
#[allow(async_fn_in_trait)]
pub trait OpenDataSource {
    /// Variables available on the portal.
    async fn list_variables(&self) -> Result<BTreeSet<String>, IconDreamError>;

    /// URL of `file_name` in the directory of `variable`.
    fn file_url(&self, variable: &str, file_name: &str) -> String;

    /// Streams `file_name` of `variable` to `target`, returning the bytes written.
    async fn fetch_file(
        &self,
        variable: &str,
        file_name: &str,
        target: &Path,
        label: &str,
    ) -> Result<u64, IconDreamError>;
}

#[derive(Debug, Clone)]
pub struct DwdClient {
    client: Client,
    base_url: String,
}

impl DwdClient {
    pub fn new() -> Result<Self, IconDreamError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, IconDreamError> {
        Ok(Self {
            client: http_client(READ_TIMEOUT).map_err(IconDreamError::HttpClient)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Replaces the five-minute limit on a file transfer that receives no data.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Result<Self, IconDreamError> {
        self.client = http_client(timeout).map_err(IconDreamError::HttpClient)?;
        Ok(self)
    }
}

impl OpenDataSource for DwdClient {
    async fn list_variables(&self) -> Result<BTreeSet<String>, IconDreamError> {
        let url = format!("{}/", self.base_url);
        let response =
            send_checked(self.client.get(&url).timeout(LISTING_TIMEOUT), &url).await?;
        let html = response
            .text()
            .await
            .map_err(|e| IconDreamError::Listing(url.clone(), e))?;
        let variables = parse_listing(&html);
        debug!("Listing of {} holds {} variables", url, variables.len());
        Ok(variables)
    }

    fn file_url(&self, variable: &str, file_name: &str) -> String {
        format!("{}/{variable}/{file_name}", self.base_url)
    }

    async fn fetch_file(
        &self,
        variable: &str,
        file_name: &str,
        target: &Path,
        label: &str,
    ) -> Result<u64, IconDreamError> {
        let url = self.file_url(variable, file_name);
        let response = send_checked(self.client.get(&url), &url).await?;
        Ok(stream_to_file(response, &url, target, label).await?)
    }
}
