// pruner/src/run.rs

use crate::config::PruneConfig;
use crate::probe::LivenessProbe;
use crate::PruneResult;
use storage::{compact, BlockStore, Height, StateStore, StorageError};

/// Errors that can abort a pruning run
#[derive(Debug, thiserror::Error)]
pub enum PruneError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Liveness probe error: {0}")]
    Liveness(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Parsed retention flags.
#[derive(Debug, Clone, Copy)]
pub struct PruneOptions {
    /// Number of most-recent blocks (and validator/consensus-params
    /// entries) to keep.
    pub full_height: Height,
    /// Number of most-recent ABCI responses to keep.
    pub min_height: Height,
}

impl PruneOptions {
    /// Parse the string-valued height flags as base-10 signed 64-bit
    /// integers. Anything non-numeric is a fatal input error.
    pub fn parse(full_height: &str, min_height: &str) -> PruneResult<Self> {
        let full_height = full_height
            .parse::<Height>()
            .map_err(|_| PruneError::Input(format!("invalid full height {:?}", full_height)))?;
        let min_height = min_height
            .parse::<Height>()
            .map_err(|_| PruneError::Input(format!("invalid min height {:?}", min_height)))?;
        Ok(Self {
            full_height,
            min_height,
        })
    }
}

/// Stages of a run, in execution order. Each stage's success is a
/// precondition for the next; the first failure is terminal and returned
/// to the caller verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckLiveness,
    ResolveHeights,
    PruneBlocks,
    CompactBlocks,
    PruneState,
    CompactState,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CheckLiveness => "check-liveness",
            Stage::ResolveHeights => "resolve-heights",
            Stage::PruneBlocks => "prune-blocks",
            Stage::CompactBlocks => "compact-blocks",
            Stage::PruneState => "prune-state",
            Stage::CompactState => "compact-state",
            Stage::Done => "done",
        }
    }
}

/// Block-store heights captured once, before any pruning, and passed
/// forward immutably: pruning never changes `current`.
#[derive(Debug, Clone, Copy)]
pub struct Heights {
    /// Oldest retained block before pruning.
    pub base: Height,
    /// Newest block.
    pub current: Height,
}

/// Execute a full pruning run: liveness precondition, height resolution,
/// block pruning, block-store compaction, state pruning, state-store
/// compaction.
///
/// If the probe reports the node running, nothing is touched and the run
/// ends successfully. Store handles are scoped to their stage and closed
/// before the same files are reopened, so compaction never runs against
/// a stale cached handle.
pub fn run(
    config: &PruneConfig,
    opts: &PruneOptions,
    probe: &dyn LivenessProbe,
) -> PruneResult<()> {
    enter(Stage::CheckLiveness);
    if probe.is_node_running()? {
        tracing::warn!("node is running, refusing to touch its stores");
        return Ok(());
    }

    enter(Stage::ResolveHeights);
    let heights = resolve_heights(config)?;
    tracing::info!(base = heights.base, current = heights.current, "resolved heights");

    enter(Stage::PruneBlocks);
    let pruned = prune_blocks(config, heights, opts)?;
    tracing::info!(pruned, "pruned block store");

    enter(Stage::CompactBlocks);
    compact(config.block_store_path())?;

    enter(Stage::PruneState);
    let deleted = prune_state(config, heights, opts)?;
    tracing::info!(deleted, "pruned state store");

    enter(Stage::CompactState);
    compact(config.state_store_path())?;

    enter(Stage::Done);
    Ok(())
}

fn enter(stage: Stage) {
    tracing::info!(stage = stage.as_str(), "entering stage");
}

/// Open the block store, capture `(base, current)`, close it. Runs
/// before any pruning so `current` reflects the pre-prune state.
fn resolve_heights(config: &PruneConfig) -> PruneResult<Heights> {
    let store = BlockStore::open(config.block_store_path())?;
    let heights = Heights {
        base: store.base()?,
        current: store.height()?,
    };
    store.close()?;
    Ok(heights)
}

/// Delegate block deletion below `current - full_height` to the block
/// store's own pruning routine, which also advances its persisted base.
fn prune_blocks(
    config: &PruneConfig,
    heights: Heights,
    opts: &PruneOptions,
) -> PruneResult<u64> {
    let store = BlockStore::open(config.block_store_path())?;
    let pruned = store.prune_blocks(heights.current - opts.full_height)?;
    store.close()?;
    Ok(pruned)
}

/// Batched deletion across the state store's three namespaces.
fn prune_state(
    config: &PruneConfig,
    heights: Heights,
    opts: &PruneOptions,
) -> PruneResult<u64> {
    let store = StateStore::open(config.state_store_path())?;
    let deleted = store.prune(
        heights.base,
        heights.current,
        opts.min_height,
        opts.full_height,
    )?;
    store.close()?;
    Ok(deleted)
}
