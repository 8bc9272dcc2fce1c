//! Board system facade for multi-board configuration.
//!
//! Provides a high-level API for bringing up several boards on one bus from a
//! single configuration.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::{FnvIndexMap, String};

use crate::config::{BoardAddress, BoardConfig, SystemConfig, MAX_BOARDS};
use crate::error::{ConfigError, Error, Result};

use super::builder::StepperBoardBuilder;
use super::driver::StepperBoard;

/// A facade for managing several boards from configuration.
///
/// # Example
///
/// ```rust,ignore
/// use stepper_board::BoardSystem;
///
/// let config = stepper_board::load_config("boards.toml")?;
/// let mut system = BoardSystem::from_config(config);
///
/// // Each board gets its own handle onto the shared bus
/// let mut gantry = system.register_board("gantry", bus_a, delay_a)?;
/// let mut turret = system.register_board("turret", bus_b, delay_b)?;
///
/// gantry.move_to_absolute_position_in_millimeters(0, 120.0, true)?;
/// ```
pub struct BoardSystem {
    /// The system configuration.
    config: SystemConfig,
    /// Boards brought up so far (handles are owned by the caller).
    registered_boards: FnvIndexMap<String<32>, BoardAddress, MAX_BOARDS>,
}

impl BoardSystem {
    /// Create a board system from configuration.
    ///
    /// No board is contacted until it is registered.
    pub fn from_config(config: SystemConfig) -> Self {
        Self {
            config,
            registered_boards: FnvIndexMap::new(),
        }
    }

    /// Get the system configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Get a board configuration by name.
    pub fn board_config(&self, name: &str) -> Option<&BoardConfig> {
        self.config.board(name)
    }

    /// Check if a board name exists in the configuration.
    pub fn has_board(&self, name: &str) -> bool {
        self.config.board(name).is_some()
    }

    /// List all configured board names.
    pub fn board_names(&self) -> impl Iterator<Item = &str> {
        self.config.board_names()
    }

    /// Build a board handle from configuration without contacting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the board name doesn't exist or building fails.
    pub fn build_board<BUS, DELAY>(
        &self,
        name: &str,
        bus: BUS,
        delay: DELAY,
    ) -> Result<StepperBoard<BUS, DELAY>>
    where
        BUS: I2c,
        DELAY: DelayNs,
    {
        StepperBoardBuilder::new()
            .bus(bus)
            .delay(delay)
            .from_config(&self.config, name)?
            .build()
    }

    /// Bring up a configured board.
    ///
    /// Resets the board, pushes its configured settings and records it as
    /// registered. The handle is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the board name doesn't exist or the board does not
    /// accept its configuration.
    pub fn register_board<BUS, DELAY>(
        &mut self,
        name: &str,
        bus: BUS,
        delay: DELAY,
    ) -> Result<StepperBoard<BUS, DELAY>>
    where
        BUS: I2c,
        DELAY: DelayNs,
    {
        let board_config = self
            .config
            .board(name)
            .ok_or_else(|| not_found(name))?
            .clone();

        let mut board = self.build_board(name, bus, delay)?;
        board.initialize()?;
        board.apply_config(&board_config)?;

        let board_name: String<32> = String::try_from(name).unwrap_or_default();
        let _ = self.registered_boards.insert(board_name, board_config.address);

        Ok(board)
    }

    /// Check if a board has been registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registered_boards
            .iter()
            .any(|(k, _)| k.as_str() == name)
    }

    /// Get the number of registered boards.
    pub fn registered_count(&self) -> usize {
        self.registered_boards.len()
    }

    /// Address of a registered board.
    pub fn registered_address(&self, name: &str) -> Option<BoardAddress> {
        self.registered_boards
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| *v)
    }
}

fn not_found(name: &str) -> Error {
    Error::Config(ConfigError::BoardNotFound(
        String::try_from(name).unwrap_or_default(),
    ))
}
