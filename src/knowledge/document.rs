use serde::{Deserialize, Serialize};

use crate::sheets::{Spreadsheet, Worksheet};

/// One spreadsheet row flattened into labeled text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// `"{spreadsheet}-{tab}"`
    pub source_label: String,
    /// `"[{label}] key: value / key: value"` in header order.
    pub fields_as_text: String,
}

impl KnowledgeDocument {
    pub fn new(source_label: impl Into<String>, fields_as_text: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            fields_as_text: fields_as_text.into(),
        }
    }

    /// `None` for rows without any non-blank cell.
    pub fn from_row(source_label: &str, header: &[String], row: &[String]) -> Option<Self> {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            return None;
        }

        let fields = header
            .iter()
            .enumerate()
            .filter(|(_, key)| !key.trim().is_empty())
            .map(|(idx, key)| {
                let value = row.get(idx).map(String::as_str).unwrap_or("");
                format!("{}: {}", key.trim(), value)
            })
            .collect::<Vec<_>>()
            .join(" / ");

        Some(Self::new(
            source_label,
            format!("[{}] {}", source_label, fields),
        ))
    }

    /// First `max_chars` characters, with `...` when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.fields_as_text, max_chars)
    }
}

pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

pub fn source_label(spreadsheet: &str, worksheet: &str) -> String {
    format!("{}-{}", spreadsheet, worksheet)
}

/// Documents for every data row of every worksheet.
pub fn collect_documents(spreadsheet: &Spreadsheet) -> Vec<KnowledgeDocument> {
    spreadsheet
        .worksheets
        .iter()
        .flat_map(|worksheet| worksheet_documents(&spreadsheet.name, worksheet))
        .collect()
}

fn worksheet_documents(spreadsheet: &str, worksheet: &Worksheet) -> Vec<KnowledgeDocument> {
    let Some(header) = worksheet.header() else {
        return Vec::new();
    };
    let label = source_label(spreadsheet, &worksheet.title);
    worksheet
        .data_rows()
        .iter()
        .filter_map(|row| KnowledgeDocument::from_row(&label, header, row))
        .collect()
}
