use catalog_sync_models::{
    CatalogItem, ContinueWatchingEntry, MediaKind, RatingsRecord, ViewKey, VirtualListEntry,
    VirtualListItem,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

type ItemKey = (MediaKind, u64);

/// Everything the store holds. This is also the snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreTables {
    pub items: BTreeMap<ItemKey, CatalogItem>,
    pub ratings: BTreeMap<ItemKey, RatingsRecord>,
    pub views: BTreeMap<ViewKey, VirtualListEntry>,
    /// Item references per view. Keyed independently of `views`, so a
    /// reference set can outlive its entry until a sweep removes it.
    pub view_items: BTreeMap<ViewKey, Vec<VirtualListItem>>,
    pub continue_watching: Vec<ContinueWatchingEntry>,
}

enum Undo {
    Item(ItemKey, Option<CatalogItem>),
    Ratings(ItemKey, Option<RatingsRecord>),
    View(ViewKey, Option<VirtualListEntry>),
    ViewItems(ViewKey, Option<Vec<VirtualListItem>>),
    ContinueWatching(Vec<ContinueWatchingEntry>),
}

/// Mutable view of the tables inside [`CatalogStore::transaction`].
///
/// Every write records the previous value so the whole unit can be
/// rolled back if the closure returns an error.
pub struct Transaction<'a> {
    tables: &'a mut StoreTables,
    journal: Vec<Undo>,
}

impl<'a> Transaction<'a> {
    pub fn item(&self, kind: MediaKind, tmdb_id: u64) -> Option<&CatalogItem> {
        self.tables.items.get(&(kind, tmdb_id))
    }

    pub fn put_item(&mut self, item: CatalogItem) {
        let key = item.key();
        let previous = self.tables.items.insert(key, item);
        self.journal.push(Undo::Item(key, previous));
    }

    /// Set one ordering field on an existing record. Returns false if there is no such record.
    pub fn set_order(
        &mut self,
        kind: MediaKind,
        tmdb_id: u64,
        cache_key: &str,
        order: u32,
    ) -> bool {
        let key = (kind, tmdb_id);
        match self.tables.items.get_mut(&key) {
            Some(item) => {
                let previous = item.clone();
                item.orders.set(cache_key, order);
                self.journal.push(Undo::Item(key, Some(previous)));
                true
            }
            None => false,
        }
    }

    /// Remove `cache_key` from every record of `kind`. Returns how many records lost it.
    pub fn clear_list(&mut self, kind: MediaKind, cache_key: &str) -> usize {
        let mut cleared = 0;
        for (key, item) in self.tables.items.range_mut((kind, 0)..=(kind, u64::MAX)) {
            if item.orders.contains(cache_key) {
                let previous = item.clone();
                item.orders.clear(cache_key);
                self.journal.push(Undo::Item(*key, Some(previous)));
                cleared += 1;
            }
        }
        cleared
    }

    pub fn put_ratings(&mut self, record: RatingsRecord) {
        let key = (record.kind, record.trakt_id);
        let previous = self.tables.ratings.insert(key, record);
        self.journal.push(Undo::Ratings(key, previous));
    }

    pub fn view(&self, key: &ViewKey) -> Option<&VirtualListEntry> {
        self.tables.views.get(key)
    }

    pub fn view_items(&self, key: &ViewKey) -> &[VirtualListItem] {
        self.tables
            .view_items
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn put_view(&mut self, entry: VirtualListEntry) {
        let key = entry.key.clone();
        let previous = self.tables.views.insert(key.clone(), entry);
        self.journal.push(Undo::View(key, previous));
    }

    pub fn replace_view_items(&mut self, key: &ViewKey, items: Vec<VirtualListItem>) {
        let previous = self.tables.view_items.insert(key.clone(), items);
        self.journal.push(Undo::ViewItems(key.clone(), previous));
    }

    pub fn append_view_items(&mut self, key: &ViewKey, items: Vec<VirtualListItem>) {
        let previous = self.tables.view_items.get(key).cloned();
        self.tables
            .view_items
            .entry(key.clone())
            .or_default()
            .extend(items);
        self.journal.push(Undo::ViewItems(key.clone(), previous));
    }

    /// Delete a view entry and its item references.
    pub fn delete_view(&mut self, key: &ViewKey) -> bool {
        let entry = self.tables.views.remove(key);
        let items = self.tables.view_items.remove(key);
        let existed = entry.is_some() || items.is_some();
        self.journal.push(Undo::View(key.clone(), entry));
        self.journal.push(Undo::ViewItems(key.clone(), items));
        existed
    }

    /// Keys of every view entry, plus keys of reference sets with no entry.
    pub fn view_keys(&self) -> (Vec<ViewKey>, Vec<ViewKey>) {
        let entries = self.tables.views.keys().cloned().collect();
        let orphans = self
            .tables
            .view_items
            .keys()
            .filter(|k| !self.tables.views.contains_key(*k))
            .cloned()
            .collect();
        (entries, orphans)
    }

    pub fn replace_continue_watching(&mut self, entries: Vec<ContinueWatchingEntry>) {
        let previous = std::mem::replace(&mut self.tables.continue_watching, entries);
        self.journal.push(Undo::ContinueWatching(previous));
    }

    fn rollback(mut self) {
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::Item(key, Some(item)) => {
                    self.tables.items.insert(key, item);
                }
                Undo::Item(key, None) => {
                    self.tables.items.remove(&key);
                }
                Undo::Ratings(key, Some(record)) => {
                    self.tables.ratings.insert(key, record);
                }
                Undo::Ratings(key, None) => {
                    self.tables.ratings.remove(&key);
                }
                Undo::View(key, Some(entry)) => {
                    self.tables.views.insert(key, entry);
                }
                Undo::View(key, None) => {
                    self.tables.views.remove(&key);
                }
                Undo::ViewItems(key, Some(items)) => {
                    self.tables.view_items.insert(key, items);
                }
                Undo::ViewItems(key, None) => {
                    self.tables.view_items.remove(&key);
                }
                Undo::ContinueWatching(entries) => {
                    self.tables.continue_watching = entries;
                }
            }
        }
    }
}

/// Transactional in-memory store for catalog records and the derived cache tables.
///
/// Writers go through [`CatalogStore::transaction`], which holds the write
/// lock for the duration of a synchronous closure; readers never observe a
/// half-applied unit.
pub struct CatalogStore {
    tables: RwLock<StoreTables>,
    dirty: AtomicBool,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::from_tables(StoreTables::default())
    }

    pub fn from_tables(tables: StoreTables) -> Self {
        Self {
            tables: RwLock::new(tables),
            dirty: AtomicBool::new(false),
        }
    }

    /// Run `f` atomically. If it returns `Err`, every write it made is undone.
    pub async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    {
        let mut tables = self.tables.write().await;
        let mut tx = Transaction {
            tables: &mut *tables,
            journal: Vec::new(),
        };
        match f(&mut tx) {
            Ok(value) => {
                if !tx.journal.is_empty() {
                    debug!(writes = tx.journal.len(), "Committed store transaction");
                    self.dirty.store(true, Ordering::Release);
                }
                Ok(value)
            }
            Err(e) => {
                debug!(writes = tx.journal.len(), "Rolling back store transaction");
                tx.rollback();
                Err(e)
            }
        }
    }

    /// Single-write convenience over [`CatalogStore::transaction`].
    pub async fn upsert(&self, item: CatalogItem) {
        let _ = self
            .transaction(|tx| {
                tx.put_item(item);
                Ok::<_, Infallible>(())
            })
            .await;
    }

    pub async fn get(&self, kind: MediaKind, tmdb_id: u64) -> Option<CatalogItem> {
        self.tables
            .read()
            .await
            .items
            .get(&(kind, tmdb_id))
            .cloned()
    }

    /// Records of `kind` in the list identified by `cache_key`, in rank order.
    pub async fn ordered(&self, kind: MediaKind, cache_key: &str) -> Vec<CatalogItem> {
        let tables = self.tables.read().await;
        let mut items: Vec<CatalogItem> = tables
            .items
            .range((kind, 0)..=(kind, u64::MAX))
            .filter(|(_, item)| item.orders.contains(cache_key))
            .map(|(_, item)| item.clone())
            .collect();
        items.sort_by_key(|item| item.order_in(cache_key));
        items
    }

    /// Records of `kind` matching `predicate`, by ascending ID.
    pub async fn filter<P>(&self, kind: MediaKind, predicate: P) -> Vec<CatalogItem>
    where
        P: Fn(&CatalogItem) -> bool,
    {
        let tables = self.tables.read().await;
        tables
            .items
            .range((kind, 0)..=(kind, u64::MAX))
            .filter(|(_, item)| predicate(item))
            .map(|(_, item)| item.clone())
            .collect()
    }

    pub async fn count(&self, kind: MediaKind) -> usize {
        let tables = self.tables.read().await;
        tables.items.range((kind, 0)..=(kind, u64::MAX)).count()
    }

    pub async fn count_in_list(&self, kind: MediaKind, cache_key: &str) -> usize {
        let tables = self.tables.read().await;
        tables
            .items
            .range((kind, 0)..=(kind, u64::MAX))
            .filter(|(_, item)| item.orders.contains(cache_key))
            .count()
    }

    pub async fn is_list_empty(&self, kind: MediaKind, cache_key: &str) -> bool {
        self.count_in_list(kind, cache_key).await == 0
    }

    pub async fn ratings(&self, kind: MediaKind, trakt_id: u64) -> Option<RatingsRecord> {
        self.tables
            .read()
            .await
            .ratings
            .get(&(kind, trakt_id))
            .cloned()
    }

    pub async fn view(&self, key: &ViewKey) -> Option<VirtualListEntry> {
        self.tables.read().await.views.get(key).cloned()
    }

    /// Item references of a view, in order.
    pub async fn view_items(&self, key: &ViewKey) -> Vec<VirtualListItem> {
        let tables = self.tables.read().await;
        let mut items = tables.view_items.get(key).cloned().unwrap_or_default();
        items.sort_by_key(|i| i.order_index);
        items
    }

    pub async fn view_count(&self) -> usize {
        self.tables.read().await.views.len()
    }

    /// Last resolved continue-watching feed.
    pub async fn continue_watching(&self) -> Vec<ContinueWatchingEntry> {
        self.tables.read().await.continue_watching.clone()
    }

    pub async fn snapshot(&self) -> StoreTables {
        self.tables.read().await.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn mark_clean(&self) {
        self.dirty.store(false, Ordering::Release);
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}
