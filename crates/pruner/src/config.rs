// pruner/src/config.rs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tool configuration. Deliberately small: the stores' location and the
/// command used to probe the node. Everything else is a CLI flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Node data directory holding `blockstore.db` and `state.db`.
    pub data_dir: PathBuf,
    /// Binary invoked as `<status_command> status` to check whether the
    /// node is still running.
    pub status_command: String,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
            status_command: "ledgerd".into(),
        }
    }
}

impl PruneConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn block_store_path(&self) -> PathBuf {
        self.data_dir.join("blockstore.db")
    }

    pub fn state_store_path(&self) -> PathBuf {
        self.data_dir.join("state.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_paths_live_under_the_data_dir() {
        let config = PruneConfig {
            data_dir: "/var/ledger".into(),
            ..Default::default()
        };
        assert_eq!(
            config.block_store_path(),
            PathBuf::from("/var/ledger/blockstore.db")
        );
        assert_eq!(
            config.state_store_path(),
            PathBuf::from("/var/ledger/state.db")
        );
    }

    #[test]
    fn partial_config_files_fall_back_to_defaults() {
        let config: PruneConfig = toml::from_str("data_dir = \"/srv/node\"").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/node"));
        assert_eq!(config.status_command, "ledgerd");
    }
}
