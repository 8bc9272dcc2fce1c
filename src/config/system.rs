//! System configuration - root configuration structure.

use heapless::{FnvIndexMap, String};
use serde::Deserialize;

use super::board::{BoardConfig, TransportConfig, WaitConfig};

/// Most boards that can share one bus.
pub const MAX_BOARDS: usize = 4;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Retry discipline shared by every board.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Blocking wait behavior shared by every board.
    #[serde(default)]
    pub wait: WaitConfig,

    /// Named board configurations.
    #[serde(default)]
    pub boards: FnvIndexMap<String<32>, BoardConfig, MAX_BOARDS>,
}

impl SystemConfig {
    /// Get a board configuration by name.
    pub fn board(&self, name: &str) -> Option<&BoardConfig> {
        self.boards
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// List all board names.
    pub fn board_names(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(|s| s.as_str())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            wait: WaitConfig::default(),
            boards: FnvIndexMap::new(),
        }
    }
}
