use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::{CatalogStore, StoreTables};

/// On-disk snapshot of the catalog store.
///
/// Binary format (bincode) with optional gzip compression, written atomically.
pub struct SnapshotStorage {
    path: PathBuf,
    use_compression: bool,
}

impl SnapshotStorage {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            use_compression: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or empty tables if there is none or it can't be read.
    pub fn load(&self) -> Result<StoreTables, StoreError> {
        if !self.path.exists() {
            debug!("Store snapshot does not exist, starting empty");
            return Ok(StoreTables::default());
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&self.path)?;

        let decoded = if self.use_compression {
            let mut decoder = GzDecoder::new(&data[..]);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed)?;
            decompressed
        } else {
            data
        };

        let tables: StoreTables = match deserialize(&decoded) {
            Ok(tables) => tables,
            Err(e) => {
                // Snapshot from an older schema: keep a copy and start fresh
                let backup_path = self.path.with_extension("bin.bak");
                if let Err(backup_err) = std::fs::copy(&self.path, &backup_path) {
                    warn!(
                        "Failed to back up incompatible snapshot: {}. Starting with an empty store.",
                        backup_err
                    );
                } else {
                    info!(
                        "Snapshot format incompatible (error: {}). Backed up to {:?} and starting with an empty store.",
                        e, backup_path
                    );
                }
                return Ok(StoreTables::default());
            }
        };

        info!(
            "Loaded store snapshot: {} items, {} ratings, {} views in {:?}",
            tables.items.len(),
            tables.ratings.len(),
            tables.views.len(),
            start.elapsed()
        );
        Ok(tables)
    }

    pub fn save(&self, tables: &StoreTables) -> Result<(), StoreError> {
        let start = std::time::Instant::now();
        let serialized = serialize(tables).map_err(|e| StoreError::Encode(e.to_string()))?;

        let encoded = if self.use_compression {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&serialized)?;
            encoder.finish()?
        } else {
            serialized
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)?;
        std::fs::rename(&temp_path, &self.path)?;

        info!(
            "Saved store snapshot: {} items in {:?}",
            tables.items.len(),
            start.elapsed()
        );
        Ok(())
    }

    pub fn set_compression(&mut self, use_compression: bool) {
        self.use_compression = use_compression;
    }

    pub fn open_store(&self) -> Result<CatalogStore, StoreError> {
        Ok(CatalogStore::from_tables(self.load()?))
    }

    /// Save the store if anything changed since the last save.
    pub async fn persist(&self, store: &CatalogStore) -> Result<bool, StoreError> {
        if !store.is_dirty() {
            debug!("Store unchanged, skipping snapshot");
            return Ok(false);
        }
        let tables = store.snapshot().await;
        self.save(&tables)?;
        store.mark_clean();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::catalog_item;
    use catalog_sync_models::MediaKind;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SnapshotStorage::new(&dir.path().join("data").join("catalog.bin"));

        let store = CatalogStore::new();
        let mut item = catalog_item(MediaKind::Movie, 550, "Fight Club");
        item.orders.set("trending", 3);
        store.upsert(item.clone()).await;

        assert!(storage.persist(&store).await.unwrap());
        assert!(!store.is_dirty());
        assert!(!storage.persist(&store).await.unwrap());

        let reopened = storage.open_store().unwrap();
        assert_eq!(reopened.get(MediaKind::Movie, 550).await, Some(item));
    }

    #[test]
    fn test_incompatible_snapshot_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.bin");
        std::fs::write(&path, b"not a snapshot").unwrap();

        let mut storage = SnapshotStorage::new(&path);
        storage.set_compression(false);
        let tables = storage.load().unwrap();

        assert!(tables.items.is_empty());
        assert!(path.with_extension("bin.bak").exists());
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SnapshotStorage::new(&dir.path().join("catalog.bin"));
        assert!(storage.load().unwrap().items.is_empty());
    }
}
