//! Builder pattern for StepperBoard.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::{BoardAddress, SystemConfig, TransportConfig, WaitConfig};
use crate::error::{ConfigError, Error, Result};
use crate::transport::Transport;

use super::driver::StepperBoard;

/// Builder for creating StepperBoard instances.
pub struct StepperBoardBuilder<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    bus: Option<BUS>,
    delay: Option<DELAY>,
    name: Option<heapless::String<32>>,
    address: Option<u8>,
    transport: TransportConfig,
    wait: WaitConfig,
}

impl<BUS, DELAY> Default for StepperBoardBuilder<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<BUS, DELAY> StepperBoardBuilder<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            bus: None,
            delay: None,
            name: None,
            address: None,
            transport: TransportConfig::default(),
            wait: WaitConfig::default(),
        }
    }

    /// Set the I2C bus.
    pub fn bus(mut self, bus: BUS) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Set the delay provider.
    pub fn delay(mut self, delay: DELAY) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the board name. Names longer than 32 bytes are truncated.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(truncated(name));
        self
    }

    /// Set the jumper-selected board address (0-3).
    pub fn address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the retry discipline.
    pub fn transport(mut self, config: TransportConfig) -> Self {
        self.transport = config;
        self
    }

    /// Set the total attempts per command.
    pub fn max_attempts(mut self, attempts: u8) -> Self {
        self.transport.max_attempts = attempts;
        self
    }

    /// Set the blocking wait behavior.
    pub fn wait(mut self, config: WaitConfig) -> Self {
        self.wait = config;
        self
    }

    /// Configure from SystemConfig by board name.
    ///
    /// Takes the board address and the shared transport and wait settings.
    /// Axis settings are pushed later with [`StepperBoard::apply_config`].
    pub fn from_config(mut self, config: &SystemConfig, board_name: &str) -> Result<Self> {
        let board = config.board(board_name).ok_or_else(|| {
            Error::Config(ConfigError::BoardNotFound(
                heapless::String::try_from(board_name).unwrap_or_default(),
            ))
        })?;

        self.name = Some(truncated(board_name));
        self.address = Some(board.address.value());
        self.transport = config.transport;
        self.wait = config.wait;
        Ok(self)
    }

    /// Build the StepperBoard.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or out of range.
    pub fn build(self) -> Result<StepperBoard<BUS, DELAY>> {
        let bus = self.bus.ok_or_else(|| missing("bus is required"))?;
        let delay = self.delay.ok_or_else(|| missing("delay is required"))?;
        let address = BoardAddress::new(self.address.unwrap_or(0))?;

        if self.transport.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(0).into());
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(0).into());
        }

        let name = match self.name {
            Some(name) => name,
            None => default_name(address),
        };

        Ok(StepperBoard::new(
            Transport::new(bus, delay, self.transport),
            address,
            name,
            self.wait,
        ))
    }
}

fn missing(what: &str) -> Error {
    Error::Config(ConfigError::ParseError(
        heapless::String::try_from(what).unwrap_or_default(),
    ))
}

fn truncated(name: &str) -> heapless::String<32> {
    let mut out = heapless::String::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn default_name(address: BoardAddress) -> heapless::String<32> {
    use core::fmt::Write;
    let mut name = heapless::String::new();
    let _ = write!(name, "board{}", address.value());
    name
}
