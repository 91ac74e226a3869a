//! In-memory item store
//!
//! Used by tests and by dev mode when MongoDB is unavailable.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use bson::DateTime;
use tokio::sync::RwLock;

use crate::db::schemas::ItemDoc;
use crate::store::{ItemStore, ItemUpdate};
use crate::types::{RatesvcError, Result};

/// Item store kept in process memory, ordered by key
#[derive(Default)]
pub struct InMemoryItemStore {
    items: RwLock<BTreeMap<String, ItemDoc>>,
    writes: AtomicUsize,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing items
    pub fn with_items(items: impl IntoIterator<Item = ItemDoc>) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        Self {
            items: RwLock::new(items),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of inserts and updates applied so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ItemStore for InMemoryItemStore {
    async fn find_by_key(&self, id: &str) -> Result<Option<ItemDoc>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<ItemDoc>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn update_by_key(&self, id: &str, update: ItemUpdate) -> Result<()> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(id)
            .ok_or_else(|| RatesvcError::NotFound(format!("item {} not found", id)))?;

        update.apply_to(item);
        item.metadata.updated_at = Some(DateTime::now());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_by_key(&self, id: &str, kind: &str, update: ItemUpdate) -> Result<()> {
        let mut items = self.items.write().await;
        let now = DateTime::now();
        let item = items.entry(id.to_string()).or_insert_with(|| {
            let mut item = ItemDoc::new(id, Some(kind));
            item.metadata.created_at = Some(now);
            item
        });

        update.apply_to(item);
        item.metadata.updated_at = Some(now);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
