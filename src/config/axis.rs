//! Axis identity, configuration and unit conversion.

use serde::Deserialize;

use crate::error::ConfigError;

use super::units::{Distance, Microsteps, Rate, Steps, Unit};

/// Number of stepper drivers on one board.
pub const AXES_PER_BOARD: usize = 3;

/// Speed the board uses after initialization, in steps/sec.
pub const DEFAULT_SPEED_STEPS_PER_SEC: f32 = 200.0;

/// Acceleration the board uses after initialization, in steps/sec².
pub const DEFAULT_ACCELERATION_STEPS_PER_SEC2: f32 = 200.0;

/// Index of a stepper driver on a board (0-2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AxisId(u8);

impl AxisId {
    /// Create a validated axis index.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidAxis` if `index` is not a driver on the board.
    pub fn new(index: u8) -> Result<Self, ConfigError> {
        if (index as usize) < AXES_PER_BOARD {
            Ok(Self(index))
        } else {
            Err(ConfigError::InvalidAxis(index))
        }
    }

    /// Raw index as sent on the wire.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every axis on a board, in order.
    pub const ALL: [AxisId; AXES_PER_BOARD] = [AxisId(0), AxisId(1), AxisId(2)];

    /// Iterate over every axis on a board.
    pub fn all() -> impl Iterator<Item = AxisId> {
        Self::ALL.into_iter()
    }
}

impl TryFrom<u8> for AxisId {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for AxisId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u8::deserialize(deserializer)?;
        AxisId::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

/// Per-axis settings from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisSettings {
    /// Axis index on the board.
    pub axis: AxisId,

    /// Cruise speed in steps per second.
    #[serde(default, rename = "speed_steps_per_sec")]
    pub speed: Option<f32>,

    /// Acceleration in steps per second squared.
    #[serde(default, rename = "acceleration_steps_per_sec2")]
    pub acceleration: Option<f32>,

    /// Steps per millimeter of linear travel.
    #[serde(default)]
    pub steps_per_millimeter: Option<f32>,

    /// Steps per output shaft revolution.
    #[serde(default)]
    pub steps_per_revolution: Option<f32>,
}

/// Host-side record of one axis' configuration.
///
/// Scale factors exist only on the host; the board is always addressed in
/// steps. Board-side values (microsteps, speed, acceleration, enabled) mirror
/// what the board last acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    /// Axis this record belongs to.
    pub axis: AxisId,
    /// Microstep divisor.
    pub microsteps: Microsteps,
    /// Steps per millimeter, if set.
    pub steps_per_millimeter: Option<f32>,
    /// Steps per revolution, if set.
    pub steps_per_revolution: Option<f32>,
    /// Cruise speed in steps/sec.
    pub speed_steps_per_sec: f32,
    /// Acceleration in steps/sec².
    pub acceleration_steps_per_sec2: f32,
    /// Whether the driver is energized.
    pub enabled: bool,
}

impl AxisConfig {
    /// Configuration of a freshly initialized board axis.
    pub fn new(axis: AxisId) -> Self {
        Self {
            axis,
            microsteps: Microsteps::default(),
            steps_per_millimeter: None,
            steps_per_revolution: None,
            speed_steps_per_sec: DEFAULT_SPEED_STEPS_PER_SEC,
            acceleration_steps_per_sec2: DEFAULT_ACCELERATION_STEPS_PER_SEC2,
            enabled: false,
        }
    }

    /// Restore board-side defaults, keeping the host-side scale factors.
    pub fn reset_board_values(&mut self) {
        *self = Self {
            steps_per_millimeter: self.steps_per_millimeter,
            steps_per_revolution: self.steps_per_revolution,
            ..Self::new(self.axis)
        };
    }

    /// Steps per one unit of `unit`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ScaleFactorNotSet` if the factor was never set.
    pub fn steps_per_unit(&self, unit: Unit) -> Result<f32, ConfigError> {
        let factor = match unit {
            Unit::Steps => return Ok(1.0),
            Unit::Millimeters => self.steps_per_millimeter,
            Unit::Revolutions => self.steps_per_revolution,
        };
        factor.ok_or(ConfigError::ScaleFactorNotSet {
            axis: self.axis.value(),
            unit,
        })
    }

    /// Convert a distance to whole steps, rounding to nearest (ties away from zero).
    pub fn distance_to_steps(&self, distance: Distance) -> Result<Steps, ConfigError> {
        let (value, unit) = match distance {
            Distance::Steps(steps) => return Ok(steps),
            Distance::Millimeters(mm) => (mm.0, Unit::Millimeters),
            Distance::Revolutions(revs) => (revs.0, Unit::Revolutions),
        };
        if !value.is_finite() {
            return Err(ConfigError::InvalidDistance(value));
        }
        let factor = self.steps_per_unit(unit)?;
        Ok(Steps::round_from(f64::from(value) * f64::from(factor)))
    }

    /// Convert steps to `unit`.
    pub fn steps_to(&self, steps: Steps, unit: Unit) -> Result<f32, ConfigError> {
        let factor = self.steps_per_unit(unit)?;
        Ok((steps.0 as f64 / f64::from(factor)) as f32)
    }

    /// Convert a speed or acceleration to steps (not rounded).
    pub fn rate_to_steps(&self, rate: Rate) -> Result<f32, ConfigError> {
        Ok(rate.value * self.steps_per_unit(rate.unit)?)
    }

    /// Convert a speed or acceleration in steps to `unit`.
    pub fn steps_rate_to(&self, steps_rate: f32, unit: Unit) -> Result<f32, ConfigError> {
        Ok(steps_rate / self.steps_per_unit(unit)?)
    }
}

/// Check that a scale factor is usable.
pub fn validate_scale_factor(value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidScaleFactor(value))
    }
}
