use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use super::{try_load_records, RecordTable};
use crate::sheets::TabularSource;

struct CachedTable {
    table: Arc<RecordTable>,
    fetched_at: Instant,
}

/// Time-boxed cache of the record table.
///
/// A refresh builds a complete replacement table and swaps it in, so readers
/// observe either the previous snapshot or the new one. Refreshes are
/// serialized; callers that wait on an in-flight refresh reuse its result.
pub struct RecordCache {
    source: Arc<dyn TabularSource>,
    spreadsheet: String,
    ttl: Duration,
    slot: RwLock<Option<CachedTable>>,
    refresh_lock: Mutex<()>,
}

impl RecordCache {
    pub fn new(source: Arc<dyn TabularSource>, spreadsheet: impl Into<String>, ttl: Duration) -> Self {
        Self {
            source,
            spreadsheet: spreadsheet.into(),
            ttl,
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn spreadsheet(&self) -> &str {
        &self.spreadsheet
    }

    /// Current table, refetched when the cached one is older than the TTL.
    pub async fn snapshot(&self) -> Arc<RecordTable> {
        if let Some(table) = self.fresh().await {
            return table;
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(table) = self.fresh().await {
            return table;
        }
        self.fetch_and_swap().await
    }

    /// Fetch now, regardless of age.
    pub async fn refresh(&self) -> Arc<RecordTable> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_swap().await
    }

    /// Drop the cached table; the next `snapshot` refetches.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
        tracing::debug!("Record cache for '{}' invalidated", self.spreadsheet);
    }

    async fn fresh(&self) -> Option<Arc<RecordTable>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.table.clone())
    }

    async fn fetch_and_swap(&self) -> Arc<RecordTable> {
        let table = match try_load_records(self.source.as_ref(), &self.spreadsheet).await {
            Ok(table) => Arc::new(table),
            Err(err) => match self.slot.read().await.as_ref() {
                Some(previous) => {
                    tracing::warn!(
                        "Refreshing '{}' failed, keeping previous {} records: {}",
                        self.spreadsheet,
                        previous.table.len(),
                        err
                    );
                    previous.table.clone()
                }
                None => {
                    tracing::error!("Failed to load records from '{}': {}", self.spreadsheet, err);
                    Arc::new(RecordTable::empty())
                }
            },
        };
        if table.is_empty() {
            tracing::warn!("Record table for '{}' is empty after refresh", self.spreadsheet);
        }

        *self.slot.write().await = Some(CachedTable {
            table: table.clone(),
            fetched_at: Instant::now(),
        });
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{MemorySource, Worksheet};

    fn sheet(rows: &[[&str; 2]]) -> Vec<Worksheet> {
        let mut values = vec![vec!["치과명".to_string(), "글 본문".to_string()]];
        values.extend(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()));
        vec![Worksheet::new("Sheet1", values)]
    }

    #[tokio::test]
    async fn snapshot_is_reused_within_ttl() {
        let source = Arc::new(MemorySource::new().with_spreadsheet("DB", sheet(&[["A", "a"]])));
        let cache = RecordCache::new(source.clone(), "DB", Duration::from_secs(3_600));

        let first = cache.snapshot().await;
        let second = cache.snapshot().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.open_count(), 1);
    }

    #[tokio::test]
    async fn expired_snapshot_is_refetched() {
        let source = Arc::new(MemorySource::new().with_spreadsheet("DB", sheet(&[["A", "a"]])));
        let cache = RecordCache::new(source.clone(), "DB", Duration::ZERO);

        cache.snapshot().await;
        cache.snapshot().await;

        assert_eq!(source.open_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_swaps_in_new_table_and_keeps_old_snapshot_intact() {
        let source = Arc::new(MemorySource::new().with_spreadsheet("DB", sheet(&[["A", "a"]])));
        let cache = RecordCache::new(source.clone(), "DB", Duration::from_secs(3_600));

        let before = cache.snapshot().await;
        source.insert("DB", sheet(&[["A", "a"], ["B", "b"]]));
        cache.invalidate().await;
        let after = cache.snapshot().await;

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }

    #[tokio::test]
    async fn refresh_fetches_immediately() {
        let source = Arc::new(MemorySource::new().with_spreadsheet("DB", sheet(&[["A", "a"]])));
        let cache = RecordCache::new(source.clone(), "DB", Duration::from_secs(3_600));

        cache.snapshot().await;
        let refreshed = cache.refresh().await;

        assert_eq!(refreshed.len(), 1);
        assert_eq!(source.open_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_snapshots_share_one_fetch() {
        let source = Arc::new(MemorySource::new().with_spreadsheet("DB", sheet(&[["A", "a"]])));
        let cache = Arc::new(RecordCache::new(source.clone(), "DB", Duration::from_secs(3_600)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.snapshot().await.len() })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.expect("join"), 1);
        }

        assert_eq!(source.open_count(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let source = Arc::new(MemorySource::new().with_spreadsheet("DB", sheet(&[["A", "a"]])));
        let cache = RecordCache::new(source.clone(), "DB", Duration::from_secs(3_600));
        let before = cache.snapshot().await;

        source.deny("DB");
        let refreshed = cache.refresh().await;

        assert_eq!(refreshed.len(), 1);
        assert!(Arc::ptr_eq(&before, &refreshed));
        assert_eq!(cache.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_first_fetch_yields_empty_table() {
        let source = Arc::new(MemorySource::new());
        source.deny("DB");
        let cache = RecordCache::new(source, "DB", Duration::from_secs(3_600));

        assert!(cache.snapshot().await.is_empty());
    }
}
