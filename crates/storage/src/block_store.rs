// storage/src/block_store.rs

use crate::{Height, StorageError, StorageResult};
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;

const BASE_HEIGHT_KEY: &[u8] = b"base_height";
const CURRENT_HEIGHT_KEY: &[u8] = b"current_height";

/// Pending deletes are committed whenever a prune batch reaches this size,
/// bounding the size of any single write transaction.
const PRUNE_BATCH_SIZE: u64 = 1000;

/// On-disk block store: serialized blocks keyed by height, plus persisted
/// base/current height bookkeeping.
///
/// `base` is the oldest retained height and `current` the newest written
/// one; `base <= current` whenever the store is non-empty. Pruning
/// advances the persisted base.
pub struct BlockStore {
    db: DB,
}

impl BlockStore {
    /// Open (or create) the block store at `path` for read-write access.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| StorageError::Open(e.to_string()))?;

        Ok(Self { db })
    }

    /// Oldest retained block height, 0 when the store is empty.
    pub fn base(&self) -> StorageResult<Height> {
        self.meta_height(BASE_HEIGHT_KEY)
    }

    /// Newest block height, 0 when the store is empty.
    pub fn height(&self) -> StorageResult<Height> {
        self.meta_height(CURRENT_HEIGHT_KEY)
    }

    /// Store a block record and maintain the height bookkeeping. The
    /// first write seeds the base; later writes only ever raise current.
    pub fn put_block(&self, height: Height, data: &[u8]) -> StorageResult<()> {
        let base = self.base()?;
        let current = self.height()?;

        let mut batch = WriteBatch::default();
        batch.put(block_key(height), data);
        if base == 0 || height < base {
            batch.put(BASE_HEIGHT_KEY, height.to_be_bytes());
        }
        if height > current {
            batch.put(CURRENT_HEIGHT_KEY, height.to_be_bytes());
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::BatchWrite(e.to_string()))
    }

    /// Fetch a block record by height.
    pub fn block(&self, height: Height) -> StorageResult<Option<Vec<u8>>> {
        self.db
            .get(block_key(height))
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Delete all block records strictly below `retain_height` and advance
    /// the persisted base. Returns the number of records removed.
    ///
    /// Pruning at or below the current base is a zero-count no-op; pruning
    /// beyond the latest height is refused so the newest block always
    /// survives.
    pub fn prune_blocks(&self, retain_height: Height) -> StorageResult<u64> {
        let base = self.base()?;
        let current = self.height()?;

        if retain_height > current {
            return Err(StorageError::Prune(format!(
                "cannot prune beyond the latest height {}",
                current
            )));
        }
        if retain_height <= base {
            return Ok(0);
        }

        let mut batch = WriteBatch::default();
        let mut pruned = 0u64;
        for height in base..retain_height {
            batch.delete(block_key(height));
            pruned += 1;
            if pruned % PRUNE_BATCH_SIZE == 0 {
                self.db
                    .write(std::mem::take(&mut batch))
                    .map_err(|e| StorageError::BatchWrite(e.to_string()))?;
            }
        }
        if !batch.is_empty() {
            self.db
                .write(batch)
                .map_err(|e| StorageError::BatchWrite(e.to_string()))?;
        }

        self.db
            .put(BASE_HEIGHT_KEY, retain_height.to_be_bytes())
            .map_err(|e| StorageError::Database(e.to_string()))?;

        tracing::debug!(pruned, new_base = retain_height, "pruned block store");
        Ok(pruned)
    }

    /// Flush and close the store, surfacing any error the final flush
    /// reports. The handle must be closed before the same files are
    /// reopened for compaction.
    pub fn close(self) -> StorageResult<()> {
        self.db
            .flush()
            .map_err(|e| StorageError::Close(e.to_string()))
    }

    fn meta_height(&self, key: &[u8]) -> StorageResult<Height> {
        match self
            .db
            .get(key)
            .map_err(|e| StorageError::Database(e.to_string()))?
        {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| StorageError::Corruption("invalid height encoding".into()))?;
                Ok(Height::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

fn block_key(height: Height) -> Vec<u8> {
    format!("B:{}", height).into_bytes()
}
