//! Spreadsheet access: the `SheetSource` seam and its Google implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::error::ReportError;
use super::google_auth::ServiceAccountAuth;
use super::metrics::record_fetch_duration;
use crate::config::GoogleConfig;

/// Raw cell grid of one tab, row-major, as the Sheets API renders it.
pub type SheetRows = Vec<Vec<Value>>;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Source of tabular spreadsheet data.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Reads each named tab of the report spreadsheet, in order. One call
    /// is one report run's worth of reads.
    async fn fetch_tabs(&self, tabs: &[&str]) -> Result<Vec<SheetRows>, ReportError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: SheetRows,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

/// Google Sheets reader authenticated as a service account.
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: Client,
    auth: ServiceAccountAuth,
    spreadsheet_id: Option<String>,
    spreadsheet_name: String,
    sheets_api_base: Url,
    drive_api_base: Url,
}

impl GoogleSheetsClient {
    pub fn new(config: &GoogleConfig) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        let auth = ServiceAccountAuth::new(client.clone(), config.service_account.clone())?;

        Ok(Self {
            client,
            auth,
            spreadsheet_id: config.spreadsheet_id.clone(),
            spreadsheet_name: config.spreadsheet_name.clone(),
            sheets_api_base: parse_base("SHEETS_API_BASE", &config.sheets_api_base)?,
            drive_api_base: parse_base("DRIVE_API_BASE", &config.drive_api_base)?,
        })
    }

    async fn resolve_spreadsheet_id(&self, token: &str) -> Result<String, ReportError> {
        if let Some(id) = &self.spreadsheet_id {
            return Ok(id.clone());
        }

        let url = endpoint(&self.drive_api_base, &["files"])?;
        let request = self.client.get(url).bearer_auth(token).query(&[
            ("q", drive_query(&self.spreadsheet_name).as_str()),
            ("fields", "files(id,name)"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ]);

        let listing: DriveFileList = send_json(request, "Drive file lookup").await?;
        let file = listing.files.into_iter().next().ok_or_else(|| {
            ReportError::DataFetch(format!(
                "Spreadsheet '{}' not found or not shared with the service account",
                self.spreadsheet_name
            ))
        })?;

        tracing::debug!(spreadsheet_id = %file.id, name = %self.spreadsheet_name, "Resolved spreadsheet");
        Ok(file.id)
    }

    async fn fetch_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        tab: &str,
    ) -> Result<SheetRows, ReportError> {
        let range = quote_tab(tab);
        let url = endpoint(
            &self.sheets_api_base,
            &["spreadsheets", spreadsheet_id, "values", &range],
        )?;
        let request = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("valueRenderOption", "FORMATTED_VALUE")]);

        let start = Instant::now();
        let result: Result<ValueRange, ReportError> =
            send_json(request, &format!("Reading tab '{}'", tab)).await;
        record_fetch_duration(tab, start.elapsed().as_secs_f64());

        let rows = result?.values;
        tracing::debug!(tab = %tab, rows = rows.len(), "Fetched sheet values");
        Ok(rows)
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch_tabs(&self, tabs: &[&str]) -> Result<Vec<SheetRows>, ReportError> {
        let token = self.auth.access_token().await?;
        let spreadsheet_id = self.resolve_spreadsheet_id(&token).await?;

        let mut grids = Vec::with_capacity(tabs.len());
        for tab in tabs {
            grids.push(self.fetch_values(&token, &spreadsheet_id, tab).await?);
        }
        Ok(grids)
    }
}

fn parse_base(key: &str, raw: &str) -> Result<Url, anyhow::Error> {
    Url::parse(raw).map_err(|e| anyhow::anyhow!("{} is not a valid URL '{}': {}", key, raw, e))
}

/// Appends percent-encoded path segments to an API base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ReportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ReportError::DataFetch(format!("Cannot use '{}' as an API base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// A1 range covering a whole tab.
fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME_TYPE
    )
}

async fn send_json<T>(request: RequestBuilder, what: &str) -> Result<T, ReportError>
where
    T: serde::de::DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|e| ReportError::DataFetch(format!("{} failed: {}", what, e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, error = %error_text, "{} failed", what);
        return Err(ReportError::DataFetch(format!(
            "{} failed with status {}",
            what, status
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ReportError::DataFetch(format!("{} returned an unreadable body: {}", what, e)))
}
