// storage/src/state_store.rs

use crate::{Height, StorageError, StorageResult};
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;

/// Maximum pending delete operations before a batch is committed and reset.
pub const BATCH_MAX_SIZE: u64 = 1000;

/// The state store's height-indexed key namespaces, each carrying its
/// literal key prefix and its retention rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Validator set snapshots.
    Validators,
    /// Consensus parameter snapshots.
    ConsensusParams,
    /// Per-block application responses; highest volume, pruned the most
    /// aggressively (retention governed by `min_height`, not `full_height`).
    AbciResponses,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Validators => "validatorsKey:",
            Namespace::ConsensusParams => "consensusParamsKey:",
            Namespace::AbciResponses => "abciResponsesKey:",
        }
    }

    /// All namespaces, in the fixed order they are pruned.
    pub fn all() -> [Namespace; 3] {
        [
            Namespace::Validators,
            Namespace::ConsensusParams,
            Namespace::AbciResponses,
        ]
    }

    /// Height below which this namespace's entries are eligible for
    /// deletion, given how many most-recent entries each rule keeps.
    pub fn retain_height(&self, current: Height, min_height: Height, full_height: Height) -> Height {
        match self {
            Namespace::AbciResponses => current - min_height,
            _ => current - full_height,
        }
    }

    fn key(&self, height: Height) -> Vec<u8> {
        format!("{}{}", self.prefix(), height).into_bytes()
    }
}

/// On-disk consensus state store: validator sets, consensus parameters
/// and ABCI responses, each keyed `prefix + decimal(height)`.
pub struct StateStore {
    db: DB,
}

impl StateStore {
    /// Open (or create) the state store at `path` for read-write access.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| StorageError::Open(e.to_string()))?;

        Ok(Self { db })
    }

    /// Store an entry under a namespace key.
    pub fn put(&self, ns: Namespace, height: Height, data: &[u8]) -> StorageResult<()> {
        self.db
            .put(ns.key(height), data)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Fetch an entry by namespace and height.
    pub fn get(&self, ns: Namespace, height: Height) -> StorageResult<Option<Vec<u8>>> {
        self.db
            .get(ns.key(height))
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Prune every namespace in fixed order, deleting entries from `base`
    /// (inclusive) up to the namespace's retain height (exclusive) in
    /// batches of at most [`BATCH_MAX_SIZE`]. Returns the total number of
    /// delete operations issued.
    ///
    /// A namespace whose retain height is at or below `base` has nothing
    /// to prune. Deleting an absent key is a no-op, so re-running over an
    /// already-pruned range is safe. A failed batch commit aborts
    /// immediately; batches already committed stay committed.
    pub fn prune(
        &self,
        base: Height,
        current: Height,
        min_height: Height,
        full_height: Height,
    ) -> StorageResult<u64> {
        let mut total = 0u64;
        for ns in Namespace::all() {
            let retain_height = ns.retain_height(current, min_height, full_height);
            let (deleted, commits) = self.prune_namespace(ns, base, retain_height)?;
            tracing::info!(
                namespace = ns.prefix(),
                retain_height,
                deleted,
                commits,
                "pruned namespace"
            );
            total += deleted;
        }
        Ok(total)
    }

    /// Delete one namespace's keys over `[from, to)`, committing every
    /// full batch mid-loop and any non-empty remainder at the end.
    /// Returns `(deletes issued, batches committed)`.
    pub(crate) fn prune_namespace(
        &self,
        ns: Namespace,
        from: Height,
        to: Height,
    ) -> StorageResult<(u64, u64)> {
        let mut batch = WriteBatch::default();
        let mut deleted = 0u64;
        let mut commits = 0u64;

        for height in from..to {
            batch.delete(ns.key(height));
            deleted += 1;
            if deleted % BATCH_MAX_SIZE == 0 {
                self.db
                    .write(std::mem::take(&mut batch))
                    .map_err(|e| StorageError::BatchWrite(e.to_string()))?;
                commits += 1;
            }
        }
        if !batch.is_empty() {
            self.db
                .write(batch)
                .map_err(|e| StorageError::BatchWrite(e.to_string()))?;
            commits += 1;
        }

        Ok((deleted, commits))
    }

    /// Flush and close the store, surfacing any error the final flush
    /// reports.
    pub fn close(self) -> StorageResult<()> {
        self.db
            .flush()
            .map_err(|e| StorageError::Close(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (StateStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::open(temp_dir.path().join("state.db")).unwrap();
        (store, temp_dir)
    }

    fn seed(store: &StateStore, from: Height, to: Height) {
        for ns in Namespace::all() {
            for h in from..=to {
                store.put(ns, h, b"entry").unwrap();
            }
        }
    }

    #[test]
    fn namespace_keys_concatenate_prefix_and_decimal_height() {
        assert_eq!(Namespace::Validators.key(42), b"validatorsKey:42");
        assert_eq!(Namespace::ConsensusParams.key(7), b"consensusParamsKey:7");
        assert_eq!(Namespace::AbciResponses.key(199), b"abciResponsesKey:199");
    }

    #[test]
    fn retention_rule_differs_for_abci_responses() {
        assert_eq!(Namespace::Validators.retain_height(2000, 10, 1880), 120);
        assert_eq!(Namespace::ConsensusParams.retain_height(2000, 10, 1880), 120);
        assert_eq!(Namespace::AbciResponses.retain_height(2000, 10, 1880), 1990);
    }

    #[test]
    fn prune_deletes_exactly_the_eligible_range() {
        let (store, _temp) = create_test_store();
        seed(&store, 1, 200);

        // validators/params retain the last 180, abci the last 20.
        let deleted = store.prune(1, 200, 20, 180).unwrap();
        assert_eq!(deleted, 19 + 19 + 179);

        for ns in [Namespace::Validators, Namespace::ConsensusParams] {
            for h in 1..20 {
                assert!(store.get(ns, h).unwrap().is_none(), "{:?} {} kept", ns, h);
            }
            for h in 20..=200 {
                assert!(store.get(ns, h).unwrap().is_some(), "{:?} {} lost", ns, h);
            }
        }
        for h in 1..180 {
            assert!(store.get(Namespace::AbciResponses, h).unwrap().is_none());
        }
        for h in 180..=200 {
            assert!(store.get(Namespace::AbciResponses, h).unwrap().is_some());
        }
    }

    #[test]
    fn retain_height_below_base_is_a_noop() {
        let (store, _temp) = create_test_store();
        seed(&store, 100, 120);

        // full_height covers the whole range: nothing eligible anywhere.
        let deleted = store.prune(100, 120, 30, 30).unwrap();
        assert_eq!(deleted, 0);
        for ns in Namespace::all() {
            assert!(store.get(ns, 100).unwrap().is_some());
        }
    }

    #[test]
    fn batches_commit_at_every_full_thousand_plus_remainder() {
        let (store, _temp) = create_test_store();

        let (deleted, commits) = store
            .prune_namespace(Namespace::AbciResponses, 0, 2500)
            .unwrap();
        assert_eq!(deleted, 2500);
        assert_eq!(commits, 3);

        let (deleted, commits) = store
            .prune_namespace(Namespace::Validators, 0, 2000)
            .unwrap();
        assert_eq!(deleted, 2000);
        assert_eq!(commits, 2);

        let (deleted, commits) = store
            .prune_namespace(Namespace::ConsensusParams, 5, 5)
            .unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(commits, 0);
    }

    #[test]
    fn pruning_absent_keys_is_idempotent() {
        let (store, _temp) = create_test_store();
        seed(&store, 1, 50);

        let first = store.prune(1, 50, 10, 10).unwrap();
        assert_eq!(first, 39 * 3);

        // Same range again: every delete targets an absent key.
        let second = store.prune(1, 50, 10, 10).unwrap();
        assert_eq!(second, first);
        for ns in Namespace::all() {
            assert!(store.get(ns, 45).unwrap().is_some());
        }
    }

    #[test]
    fn keys_outside_the_eligible_range_are_untouched() {
        let (store, _temp) = create_test_store();
        seed(&store, 1, 100);
        // Entry below base must survive: candidates start at base.
        store.put(Namespace::Validators, -5, b"pre-genesis").unwrap();

        store.prune(10, 100, 10, 10).unwrap();
        assert!(store.get(Namespace::Validators, -5).unwrap().is_some());
        for ns in Namespace::all() {
            for h in 1..10 {
                assert!(store.get(ns, h).unwrap().is_some(), "{:?} {} lost", ns, h);
            }
        }
    }
}
