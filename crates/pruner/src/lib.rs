// pruner/src/lib.rs

//! Offline pruning for a stopped ledger node.
//!
//! Deletes historical records below configurable retention heights from
//! the node's block store and consensus state store, then compacts both
//! stores' files to physically reclaim the space. The node that owns
//! the stores must be down for the whole run; a liveness probe is
//! checked once before anything is touched.

pub mod config;
pub mod probe;
pub mod run;

pub use config::PruneConfig;
pub use probe::{LivenessProbe, StatusCommandProbe};
pub use run::{run, Heights, PruneError, PruneOptions, Stage};

/// Result type for pruning runs
pub type PruneResult<T> = Result<T, PruneError>;
