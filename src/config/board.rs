//! Board, bus and wait configuration from TOML.

use heapless::Vec;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::protocol::BASE_BUS_ADDRESS;

use super::axis::{AxisSettings, AXES_PER_BOARD};
use super::units::Microsteps;

/// Highest address selectable with the board jumpers.
pub const MAX_BOARD_ADDRESS: u8 = 3;

/// Board number selected by jumpers (0-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BoardAddress(u8);

impl BoardAddress {
    /// Create a validated board address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBoardAddress` above [`MAX_BOARD_ADDRESS`].
    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if value <= MAX_BOARD_ADDRESS {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidBoardAddress(value))
        }
    }

    /// Board number.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// 7-bit bus address the board answers at.
    #[inline]
    pub const fn bus_address(self) -> u8 {
        BASE_BUS_ADDRESS + self.0
    }
}

impl TryFrom<u8> for BoardAddress {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for BoardAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u8::deserialize(deserializer)?;
        BoardAddress::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

/// Retry discipline of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Total attempts per command, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,

    /// Time between writing a request and reading its response, in microseconds.
    #[serde(default = "default_response_delay_us")]
    pub response_delay_us: u32,
}

fn default_max_attempts() -> u8 {
    3
}

fn default_response_delay_us() -> u32 {
    500
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            response_delay_us: default_response_delay_us(),
        }
    }
}

/// Polling behavior of blocking waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WaitConfig {
    /// Delay between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,

    /// Give up after this much accumulated poll delay. `None` waits forever.
    #[serde(default)]
    pub timeout_ms: Option<u32>,
}

fn default_poll_interval_ms() -> u32 {
    20
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: None,
        }
    }
}

impl WaitConfig {
    /// Same polling interval with a deadline.
    pub fn with_timeout_ms(self, timeout_ms: u32) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
            ..self
        }
    }
}

/// One board from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Jumper-selected board number.
    pub address: BoardAddress,

    /// Board-wide microstep divisor.
    #[serde(default)]
    pub microstepping: Option<Microsteps>,

    /// Energize the drivers once configured.
    #[serde(default)]
    pub enabled: bool,

    /// Per-axis settings (at most one entry per axis).
    #[serde(default)]
    pub axes: Vec<AxisSettings, AXES_PER_BOARD>,
}

impl BoardConfig {
    /// Settings for one axis, if present.
    pub fn axis(&self, axis: u8) -> Option<&AxisSettings> {
        self.axes.iter().find(|a| a.axis.value() == axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_address_range() {
        for n in 0..=MAX_BOARD_ADDRESS {
            assert!(BoardAddress::new(n).is_ok());
        }
        assert_eq!(BoardAddress::new(4), Err(ConfigError::InvalidBoardAddress(4)));
    }

    #[test]
    fn test_bus_address() {
        assert_eq!(BoardAddress::new(2).unwrap().bus_address(), BASE_BUS_ADDRESS + 2);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TransportConfig::default().max_attempts, 3);
        assert_eq!(WaitConfig::default().timeout_ms, None);
        assert_eq!(WaitConfig::default().with_timeout_ms(500).timeout_ms, Some(500));
    }
}
