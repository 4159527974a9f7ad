use crate::{Result, Table};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
struct Entry {
    table: Arc<Table>,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct DatasetCache {
    ttl: Option<Duration>,
    entries: HashMap<String, Entry>,
}

impl DatasetCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        DatasetCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_load<F>(&mut self, key: &str, loader: F) -> Result<Arc<Table>>
    where
        F: FnOnce() -> Result<Table>,
    {
        self.get_or_load_at(key, Utc::now(), loader)
    }

    /// Same as [`get_or_load`](Self::get_or_load) with an explicit clock.
    /// A failing loader leaves any existing entry in place.
    pub fn get_or_load_at<F>(
        &mut self,
        key: &str,
        now: DateTime<Utc>,
        loader: F,
    ) -> Result<Arc<Table>>
    where
        F: FnOnce() -> Result<Table>,
    {
        if let Some(entry) = self.entries.get(key) {
            if !self.is_expired(entry, now) {
                debug!("Cache hit for {}", key);
                return Ok(Arc::clone(&entry.table));
            }
            info!("Cached dataset {} expired, reloading", key);
        }

        let table = Arc::new(loader()?);
        self.entries.insert(
            key.to_string(),
            Entry {
                table: Arc::clone(&table),
                loaded_at: now,
            },
        );
        Ok(table)
    }

    pub fn loaded_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|e| e.loaded_at)
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| now - entry.loaded_at >= ttl)
    }
}
