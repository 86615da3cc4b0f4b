// pruner/src/probe.rs

use crate::PruneResult;
use std::process::{Command, Stdio};

/// Liveness check for the node that owns the stores. Pruning mutates the
/// store files in place, so it must never proceed while a live writer
/// could be holding them.
pub trait LivenessProbe {
    /// Reports whether the node process is currently running. An `Err`
    /// means the probe could not determine liveness at all; the run
    /// treats that as fatal rather than guessing.
    fn is_node_running(&self) -> PruneResult<bool>;
}

/// Probe that shells out to the node binary's `status` subcommand.
///
/// A successful exit means a node answered, so it is running. A non-zero
/// exit and a probe that cannot be launched at all (binary not on PATH)
/// both count as "not running" and are indistinguishable here; a
/// stricter probe can report the second case as
/// [`PruneError::Liveness`](crate::PruneError::Liveness) instead.
pub struct StatusCommandProbe {
    command: String,
}

impl StatusCommandProbe {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl LivenessProbe for StatusCommandProbe {
    fn is_node_running(&self) -> PruneResult<bool> {
        Ok(Command::new(&self.command)
            .arg("status")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false))
    }
}
