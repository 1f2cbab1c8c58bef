//! Tabular document sources.
//!
//! A source resolves a spreadsheet by name and returns every worksheet as
//! raw string cells. Header interpretation lives in `crate::records` and
//! `crate::knowledge`.

mod google;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::errors::ApiError;

pub use google::GoogleSheetsSource;
pub use memory::MemorySource;

/// One tab of a spreadsheet. The first row, when present, is the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    pub title: String,
    pub values: Vec<Vec<String>>,
}

impl Worksheet {
    pub fn new(title: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        Self {
            title: title.into(),
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn header(&self) -> Option<&[String]> {
        self.values.first().map(|row| row.as_slice())
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.values.is_empty() {
            &[]
        } else {
            &self.values[1..]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spreadsheet {
    pub name: String,
    pub worksheets: Vec<Worksheet>,
}

impl Spreadsheet {
    pub fn first_worksheet(&self) -> Option<&Worksheet> {
        self.worksheets.first()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("spreadsheet '{0}' not found")]
    NotFound(String),
    #[error("spreadsheet '{0}' is not shared with this account")]
    PermissionDenied(String),
    #[error("spreadsheet backend error: {0}")]
    Backend(String),
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(name) | SourceError::PermissionDenied(name) => {
                ApiError::SourceNotFound(name)
            }
            SourceError::Backend(msg) => ApiError::BackendFailure(msg),
        }
    }
}

#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Source name for logging (e.g. "google_sheets", "memory").
    fn name(&self) -> &str;

    /// Open a spreadsheet by its display name and read every worksheet.
    async fn open(&self, spreadsheet: &str) -> Result<Spreadsheet, SourceError>;
}
