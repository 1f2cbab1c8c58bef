//! Historical blog posts read from the records spreadsheet.

mod cache;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sheets::{SourceError, TabularSource, Worksheet};

pub use cache::RecordCache;

/// One past post.
///
/// Every field is kept as the sheet's text, so an author such as `"007"`
/// is never turned into a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub author: String,
    pub topic: String,
    pub file_path: Option<String>,
    pub prior_link: Option<String>,
    pub content: String,
    pub date: Option<String>,
}

impl Record {
    /// Only records with some content can serve as a style reference.
    pub fn is_eligible(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Author,
    Topic,
    FilePath,
    Link,
    Content,
}

/// Sheet header labels (Korean and canonical English) and the field they fill.
const HEADER_MAP: [(&str, Field); 12] = [
    ("날짜", Field::Date),
    ("치과명", Field::Author),
    ("주제", Field::Topic),
    ("파일위치", Field::FilePath),
    ("기존링크", Field::Link),
    ("글본문", Field::Content),
    ("date", Field::Date),
    ("dentistname", Field::Author),
    ("topic", Field::Topic),
    ("filepath", Field::FilePath),
    ("link", Field::Link),
    ("content", Field::Content),
];

fn field_for_header(label: &str) -> Option<Field> {
    let compact: String = label
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    HEADER_MAP
        .iter()
        .find(|(name, _)| *name == compact)
        .map(|(_, field)| *field)
}

/// Immutable snapshot of every record in the source tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    records: Vec<Record>,
}

impl RecordTable {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Interpret a worksheet whose first row is the header.
    pub fn from_worksheet(worksheet: &Worksheet) -> Self {
        let Some(header) = worksheet.header() else {
            return Self::empty();
        };
        let columns: Vec<Option<Field>> = header.iter().map(|h| field_for_header(h)).collect();

        let records = worksheet
            .data_rows()
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| {
                let mut record = Record::default();
                for (idx, field) in columns.iter().enumerate() {
                    let Some(field) = field else { continue };
                    let cell = row.get(idx).cloned().unwrap_or_default();
                    match field {
                        Field::Date => record.date = optional(cell),
                        Field::Author => record.author = cell,
                        Field::Topic => record.topic = cell,
                        Field::FilePath => record.file_path = optional(cell),
                        Field::Link => record.prior_link = optional(cell),
                        Field::Content => record.content = cell,
                    }
                }
                record
            })
            .collect();

        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted, de-duplicated author labels.
    pub fn authors(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.author.clone())
            .filter(|a| !a.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Eligible records whose author matches exactly (case and whitespace included).
    pub fn by_author<'a>(&'a self, author: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records
            .iter()
            .filter(move |r| r.author == author && r.is_eligible())
    }
}

fn optional(cell: String) -> Option<String> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(cell)
    }
}

/// Read the first worksheet of `spreadsheet`.
///
/// A spreadsheet without worksheets reads as an empty table; source
/// failures are returned to the caller.
pub async fn try_load_records(
    source: &dyn TabularSource,
    spreadsheet: &str,
) -> Result<RecordTable, SourceError> {
    let sheet = source.open(spreadsheet).await?;
    let Some(worksheet) = sheet.first_worksheet() else {
        tracing::warn!("Spreadsheet '{}' has no worksheets", spreadsheet);
        return Ok(RecordTable::empty());
    };
    let table = RecordTable::from_worksheet(worksheet);
    tracing::info!(
        "Loaded {} records from '{}' ({})",
        table.len(),
        spreadsheet,
        source.name()
    );
    Ok(table)
}

/// Like [`try_load_records`], but a missing, unshared or failing spreadsheet
/// yields an empty table. The cause is logged so the caller can show a
/// "no data" state.
pub async fn load_records(source: &dyn TabularSource, spreadsheet: &str) -> RecordTable {
    try_load_records(source, spreadsheet)
        .await
        .unwrap_or_else(|err| {
            log_source_error(spreadsheet, &err);
            RecordTable::empty()
        })
}

fn log_source_error(spreadsheet: &str, err: &SourceError) {
    match err {
        SourceError::NotFound(name) => {
            tracing::warn!("Spreadsheet '{}' not found; check the name and sharing", name)
        }
        SourceError::PermissionDenied(name) => {
            tracing::warn!("Spreadsheet '{}' is not shared with the service account", name)
        }
        err => tracing::error!("Failed to load records from '{}': {}", spreadsheet, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::MemorySource;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn korean_sheet() -> Worksheet {
        Worksheet::new(
            "Sheet1",
            vec![
                row(&["날짜", "치과명", "주제", "파일 위치", "기존 링크", "글 본문"]),
                row(&["2024-01-02", "밝은치과", "임플란트", "", "https://blog/1", "첫 글"]),
                row(&["2024-02-03", "007", "스케일링", "/a.docx", "", "둘째 글"]),
                row(&["", "", "", "", "", ""]),
                row(&["2024-03-04", "밝은치과", "교정"]),
            ],
        )
    }

    #[test]
    fn maps_korean_headers_to_fields() {
        let table = RecordTable::from_worksheet(&korean_sheet());
        assert_eq!(table.len(), 3);

        let first = &table.records()[0];
        assert_eq!(first.author, "밝은치과");
        assert_eq!(first.topic, "임플란트");
        assert_eq!(first.date.as_deref(), Some("2024-01-02"));
        assert_eq!(first.prior_link.as_deref(), Some("https://blog/1"));
        assert_eq!(first.file_path, None);
        assert_eq!(first.content, "첫 글");
    }

    #[test]
    fn numeric_looking_author_stays_text() {
        let table = RecordTable::from_worksheet(&korean_sheet());
        assert_eq!(table.records()[1].author, "007");
        assert_eq!(table.by_author("007").count(), 1);
        assert_eq!(table.by_author("7").count(), 0);
    }

    #[test]
    fn short_rows_are_padded_and_ineligible_without_content() {
        let table = RecordTable::from_worksheet(&korean_sheet());
        let short = &table.records()[2];
        assert_eq!(short.topic, "교정");
        assert!(!short.is_eligible());
        assert_eq!(table.by_author("밝은치과").count(), 1);
    }

    #[test]
    fn header_matching_ignores_spacing_and_accepts_english() {
        assert_eq!(field_for_header("파일위치"), Some(Field::FilePath));
        assert_eq!(field_for_header(" 글 본문 "), Some(Field::Content));
        assert_eq!(field_for_header("DentistName"), Some(Field::Author));
        assert_eq!(field_for_header("비고"), None);
    }

    #[test]
    fn authors_are_sorted_and_unique() {
        let table = RecordTable::from_worksheet(&korean_sheet());
        assert_eq!(table.authors(), vec!["007".to_string(), "밝은치과".to_string()]);
    }

    #[test]
    fn author_match_is_exact() {
        let table = RecordTable::new(vec![
            Record {
                author: "Smile".into(),
                content: "a".into(),
                ..Default::default()
            },
            Record {
                author: "smile ".into(),
                content: "b".into(),
                ..Default::default()
            },
        ]);
        assert_eq!(table.by_author("Smile").count(), 1);
        assert_eq!(table.by_author("smile").count(), 0);
    }

    #[tokio::test]
    async fn missing_spreadsheet_loads_as_empty_table() {
        let source = MemorySource::new();
        let table = load_records(&source, "블로그 포스팅 DB").await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn empty_first_tab_loads_as_empty_table() {
        let source = MemorySource::new()
            .with_spreadsheet("DB", vec![Worksheet::new("Sheet1", vec![])]);
        let table = load_records(&source, "DB").await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn only_first_tab_is_read() {
        let source = MemorySource::new().with_spreadsheet(
            "DB",
            vec![
                korean_sheet(),
                Worksheet::new("Other", vec![row(&["치과명", "글 본문"]), row(&["x", "y"])]),
            ],
        );
        let table = load_records(&source, "DB").await;
        assert_eq!(table.len(), 3);
    }
}
