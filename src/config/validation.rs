//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::axis::validate_scale_factor;
use super::board::BoardConfig;
use super::SystemConfig;

/// Validate a system configuration.
///
/// Checks:
/// - Retry attempts and poll interval are usable
/// - Board addresses are unique
/// - No axis is configured twice on one board
/// - Speeds, accelerations and scale factors are positive
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    if config.transport.max_attempts == 0 {
        return Err(Error::Config(ConfigError::InvalidMaxAttempts(
            config.transport.max_attempts,
        )));
    }

    if config.wait.poll_interval_ms == 0 {
        return Err(Error::Config(ConfigError::InvalidPollInterval(
            config.wait.poll_interval_ms,
        )));
    }

    for (i, (name, board)) in config.boards.iter().enumerate() {
        // Addresses must be unique across the bus
        let clash = config
            .boards
            .values()
            .skip(i + 1)
            .any(|other| other.address == board.address);
        if clash {
            return Err(Error::Config(ConfigError::DuplicateBoardAddress(
                board.address.value(),
            )));
        }

        validate_board(name.as_str(), board)?;
    }

    Ok(())
}

fn validate_board(name: &str, board: &BoardConfig) -> Result<()> {
    for (i, settings) in board.axes.iter().enumerate() {
        if board.axes[i + 1..].iter().any(|a| a.axis == settings.axis) {
            return Err(Error::Config(ConfigError::DuplicateAxis {
                board: heapless::String::try_from(name).unwrap_or_default(),
                axis: settings.axis.value(),
            }));
        }

        if let Some(speed) = settings.speed {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(Error::Config(ConfigError::InvalidSpeed(speed)));
            }
        }

        if let Some(accel) = settings.acceleration {
            if !(accel.is_finite() && accel > 0.0) {
                return Err(Error::Config(ConfigError::InvalidAcceleration(accel)));
            }
        }

        if let Some(factor) = settings.steps_per_millimeter {
            validate_scale_factor(factor)?;
        }

        if let Some(factor) = settings.steps_per_revolution {
            validate_scale_factor(factor)?;
        }
    }

    Ok(())
}
