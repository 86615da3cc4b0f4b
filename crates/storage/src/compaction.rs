// storage/src/compaction.rs

use crate::{StorageError, StorageResult};
use rocksdb::{Options, DB};
use std::path::Path;

/// Physically reclaim the space logical deletion freed in the store at
/// `path` by compacting its full key range.
///
/// The store is opened directly rather than through the block/state
/// abstractions, and must already exist. Compaction never changes the
/// logical key set and is a safe no-op on an already-compact store. The
/// final flush is the authoritative result: the compaction request
/// itself reports nothing, and a failed close-time flush would
/// otherwise go unnoticed.
pub fn compact(path: impl AsRef<Path>) -> StorageResult<()> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "compacting store");

    let mut opts = Options::default();
    opts.create_if_missing(false);

    let db = DB::open(&opts, path).map_err(|e| StorageError::Open(e.to_string()))?;
    db.compact_range(None::<&[u8]>, None::<&[u8]>);
    db.flush().map_err(|e| StorageError::Close(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Namespace, StateStore};
    use tempfile::TempDir;

    #[test]
    fn compaction_preserves_the_logical_key_set() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.db");

        let store = StateStore::open(&path).unwrap();
        for h in 1..=100 {
            store.put(Namespace::Validators, h, b"entry").unwrap();
        }
        store.prune_namespace(Namespace::Validators, 1, 50).unwrap();
        store.close().unwrap();

        compact(&path).unwrap();

        let store = StateStore::open(&path).unwrap();
        for h in 1..50 {
            assert!(store.get(Namespace::Validators, h).unwrap().is_none());
        }
        for h in 50..=100 {
            assert!(store.get(Namespace::Validators, h).unwrap().is_some());
        }
    }

    #[test]
    fn compacting_twice_is_a_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.db");
        StateStore::open(&path).unwrap().close().unwrap();

        compact(&path).unwrap();
        compact(&path).unwrap();
    }

    #[test]
    fn compacting_a_missing_store_fails_to_open() {
        let temp_dir = TempDir::new().unwrap();
        let err = compact(temp_dir.path().join("nope.db")).unwrap_err();
        assert!(matches!(err, StorageError::Open(_)));
    }
}
