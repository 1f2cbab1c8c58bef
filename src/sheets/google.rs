use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{SourceError, Spreadsheet, TabularSource, Worksheet};
use crate::core::config::settings::SheetsSettings;
use crate::core::errors::ApiError;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Google Sheets over REST: Drive v3 name lookup + Sheets v4 `values:batchGet`.
///
/// Authentication is an opaque OAuth bearer token supplied by configuration.
#[derive(Clone)]
pub struct GoogleSheetsSource {
    drive_base_url: String,
    sheets_base_url: String,
    access_token: String,
    client: Client,
}

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl GoogleSheetsSource {
    pub fn new(
        drive_base_url: impl Into<String>,
        sheets_base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            drive_base_url: drive_base_url.into().trim_end_matches('/').to_string(),
            sheets_base_url: sheets_base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            client,
        })
    }

    pub fn from_settings(settings: &SheetsSettings) -> Result<Self, ApiError> {
        let token = settings.access_token.as_deref().ok_or_else(|| {
            ApiError::Configuration("sheets.access_token is not set".to_string())
        })?;
        Self::new(
            &settings.drive_base_url,
            &settings.sheets_base_url,
            token,
            settings.timeout,
        )
    }

    async fn find_spreadsheet_id(&self, name: &str) -> Result<String, SourceError> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query_literal(name),
            SPREADSHEET_MIME
        );
        let url = format!(
            "{}/files?q={}&fields=files(id,name)&supportsAllDrives=true&includeItemsFromAllDrives=true",
            self.drive_base_url,
            urlencoding::encode(&query)
        );

        let listing: DriveFileList = self.get_json(&url, name).await?;
        listing
            .files
            .into_iter()
            .next()
            .map(|file| file.id)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    async fn worksheet_titles(&self, id: &str, name: &str) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/spreadsheets/{}?fields=sheets.properties.title",
            self.sheets_base_url,
            urlencoding::encode(id)
        );
        let meta: SpreadsheetMeta = self.get_json(&url, name).await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn read_values(
        &self,
        id: &str,
        name: &str,
        titles: &[String],
    ) -> Result<Vec<Vec<Vec<String>>>, SourceError> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let ranges = titles
            .iter()
            .map(|title| format!("ranges={}", urlencoding::encode(&quote_sheet_title(title))))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!(
            "{}/spreadsheets/{}/values:batchGet?majorDimension=ROWS&{}",
            self.sheets_base_url,
            urlencoding::encode(id),
            ranges
        );

        let response: BatchGetResponse = self.get_json(&url, name).await?;
        let mut tables: Vec<Vec<Vec<String>>> = response
            .value_ranges
            .into_iter()
            .map(|range| {
                range
                    .values
                    .into_iter()
                    .map(|row| row.iter().map(cell_to_string).collect())
                    .collect()
            })
            .collect();
        tables.resize(titles.len(), Vec::new());
        Ok(tables)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        name: &str,
    ) -> Result<T, SourceError> {
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SourceError::Backend(e.to_string()))?;

        match res.status() {
            status if status.is_success() => res
                .json::<T>()
                .await
                .map_err(|e| SourceError::Backend(format!("malformed response: {}", e))),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(name.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SourceError::PermissionDenied(name.to_string()))
            }
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(SourceError::Backend(format!("{}: {}", status, text)))
            }
        }
    }
}

#[async_trait]
impl TabularSource for GoogleSheetsSource {
    fn name(&self) -> &str {
        "google_sheets"
    }

    async fn open(&self, spreadsheet: &str) -> Result<Spreadsheet, SourceError> {
        let id = self.find_spreadsheet_id(spreadsheet).await?;
        let titles = self.worksheet_titles(&id, spreadsheet).await?;
        let tables = self.read_values(&id, spreadsheet, &titles).await?;

        tracing::debug!(
            "Opened spreadsheet '{}' ({} worksheets)",
            spreadsheet,
            titles.len()
        );

        Ok(Spreadsheet {
            name: spreadsheet.to_string(),
            worksheets: titles
                .into_iter()
                .zip(tables)
                .map(|(title, values)| Worksheet::new(title, values))
                .collect(),
        })
    }
}

fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// A1 notation requires single quotes around titles; embedded quotes are doubled.
fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Cells stay text; numeric-looking values are never reinterpreted.
fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
