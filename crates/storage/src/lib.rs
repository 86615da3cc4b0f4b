// storage/src/lib.rs

//! Embedded Store Layer
//!
//! This crate wraps the node's two on-disk RocksDB stores for offline
//! maintenance:
//! - Block store: serialized blocks indexed by height, with persisted
//!   base/current height bookkeeping and height-range pruning
//! - State store: validator sets, consensus parameters and ABCI
//!   responses indexed by height, with batched namespace pruning
//! - Full-range compaction to physically reclaim space after pruning

pub mod block_store;
pub mod compaction;
pub mod state_store;

pub use block_store::BlockStore;
pub use compaction::compact;
pub use state_store::{Namespace, StateStore, BATCH_MAX_SIZE};

/// Ledger block number. Heights are signed to match the node's own
/// height arithmetic; retention cutoffs can go negative and must
/// compare, not wrap.
pub type Height = i64;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Failed to close store: {0}")]
    Close(String),

    #[error("Prune error: {0}")]
    Prune(String),

    #[error("Compaction error: {0}")]
    Compaction(String),

    #[error("Batch write error: {0}")]
    BatchWrite(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
