use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{SourceError, Spreadsheet, TabularSource, Worksheet};

/// In-process source for offline runs and tests.
#[derive(Default)]
pub struct MemorySource {
    spreadsheets: RwLock<HashMap<String, Vec<Worksheet>>>,
    denied: RwLock<HashSet<String>>,
    opens: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spreadsheet(self, name: impl Into<String>, worksheets: Vec<Worksheet>) -> Self {
        self.insert(name, worksheets);
        self
    }

    /// Replace the contents of a spreadsheet.
    pub fn insert(&self, name: impl Into<String>, worksheets: Vec<Worksheet>) {
        if let Ok(mut guard) = self.spreadsheets.write() {
            guard.insert(name.into(), worksheets);
        }
    }

    /// Make a spreadsheet answer as if it was not shared with us.
    pub fn deny(&self, name: impl Into<String>) {
        if let Ok(mut guard) = self.denied.write() {
            guard.insert(name.into());
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TabularSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn open(&self, spreadsheet: &str) -> Result<Spreadsheet, SourceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let denied = self
            .denied
            .read()
            .map(|guard| guard.contains(spreadsheet))
            .unwrap_or(false);
        if denied {
            return Err(SourceError::PermissionDenied(spreadsheet.to_string()));
        }

        let guard = self
            .spreadsheets
            .read()
            .map_err(|_| SourceError::Backend("memory source poisoned".to_string()))?;
        let worksheets = guard
            .get(spreadsheet)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(spreadsheet.to_string()))?;

        Ok(Spreadsheet {
            name: spreadsheet.to_string(),
            worksheets,
        })
    }
}
