//! Unit types for physical quantities.
//!
//! Provides type-safe representations of positions in steps, millimeters and
//! revolutions so the three unit systems cannot be mixed up at call sites.

use core::fmt;
use core::ops::{Add, Neg, Sub};

use serde::Deserialize;

use crate::error::ConfigError;

/// Unit system for positions, speeds and accelerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Raw motor (micro)steps.
    Steps,
    /// Linear millimeters, via steps per millimeter.
    Millimeters,
    /// Output shaft revolutions, via steps per revolution.
    Revolutions,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Steps => write!(f, "steps"),
            Unit::Millimeters => write!(f, "millimeters"),
            Unit::Revolutions => write!(f, "revolutions"),
        }
    }
}

/// Motor position in steps (absolute from origin).
///
/// Uses i64 on the host; positions sent to the board must fit in i32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Steps(pub i64);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Get absolute value as u64.
    #[inline]
    pub fn abs(self) -> u64 {
        self.0.unsigned_abs()
    }

    /// Narrow to the 32-bit wire representation.
    pub fn to_wire(self) -> Result<i32, ConfigError> {
        i32::try_from(self.0).map_err(|_| ConfigError::PositionOutOfRange(self.0))
    }

    /// Round a fractional step count to the nearest whole step.
    ///
    /// Ties round away from zero, so `2.5` becomes 3 and `-2.5` becomes -3.
    /// Takes `f64` so that ties stay exact beyond 2^24 steps.
    pub fn round_from(steps: f64) -> Self {
        Self(libm::round(steps) as i64)
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Steps {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Linear distance in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Angular distance in output shaft revolutions.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Revolutions(pub f32);

impl Revolutions {
    /// Create a new Revolutions value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// A position or displacement in any supported unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    /// Exact step count.
    Steps(Steps),
    /// Millimeters, rounded to the nearest step on conversion.
    Millimeters(Millimeters),
    /// Revolutions, rounded to the nearest step on conversion.
    Revolutions(Revolutions),
}

impl Distance {
    /// Unit this distance is expressed in.
    pub fn unit(&self) -> Unit {
        match self {
            Distance::Steps(_) => Unit::Steps,
            Distance::Millimeters(_) => Unit::Millimeters,
            Distance::Revolutions(_) => Unit::Revolutions,
        }
    }
}

impl From<Steps> for Distance {
    fn from(value: Steps) -> Self {
        Distance::Steps(value)
    }
}

impl From<Millimeters> for Distance {
    fn from(value: Millimeters) -> Self {
        Distance::Millimeters(value)
    }
}

impl From<Revolutions> for Distance {
    fn from(value: Revolutions) -> Self {
        Distance::Revolutions(value)
    }
}

/// A speed (unit/s) or acceleration (unit/s²) in any supported unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    /// Magnitude per second (or per second squared).
    pub value: f32,
    /// Unit of the numerator.
    pub unit: Unit,
}

impl Rate {
    /// Create a rate.
    #[inline]
    pub const fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Rate in steps.
    #[inline]
    pub const fn steps(value: f32) -> Self {
        Self::new(value, Unit::Steps)
    }

    /// Rate in millimeters.
    #[inline]
    pub const fn millimeters(value: f32) -> Self {
        Self::new(value, Unit::Millimeters)
    }

    /// Rate in revolutions.
    #[inline]
    pub const fn revolutions(value: f32) -> Self {
        Self::new(value, Unit::Revolutions)
    }
}

/// Microstep divisor (1, 2, 4, 8, 16, 32).
///
/// Validated at construction against the divisors the board supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Microsteps(u16);

impl Microsteps {
    /// Full step (no microstepping).
    pub const FULL: Self = Self(1);
    /// Half step.
    pub const HALF: Self = Self(2);
    /// Quarter step.
    pub const QUARTER: Self = Self(4);
    /// Eighth step.
    pub const EIGHTH: Self = Self(8);
    /// Sixteenth step.
    pub const SIXTEENTH: Self = Self(16);
    /// Thirty-second step (maximum resolution).
    pub const THIRTY_SECOND: Self = Self(32);

    /// Valid microstep values.
    pub const VALID_VALUES: [u16; 6] = [1, 2, 4, 8, 16, 32];

    /// Create a new Microsteps value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMicrosteps` if the board does not support the divisor.
    pub fn new(value: u16) -> Result<Self, ConfigError> {
        if Self::VALID_VALUES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidMicrosteps(value))
        }
    }

    /// Get the raw divisor value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Check if a value is valid.
    #[inline]
    pub fn is_valid(value: u16) -> bool {
        Self::VALID_VALUES.contains(&value)
    }
}

impl Default for Microsteps {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<u16> for Microsteps {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Microsteps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u16::deserialize(deserializer)?;
        Microsteps::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to Millimeters.
    fn millimeters(self) -> Millimeters;
    /// Convert to Revolutions.
    fn revolutions(self) -> Revolutions;
}

impl UnitExt for f32 {
    #[inline]
    fn millimeters(self) -> Millimeters {
        Millimeters(self)
    }

    #[inline]
    fn revolutions(self) -> Revolutions {
        Revolutions(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microsteps_valid_values() {
        for &v in &Microsteps::VALID_VALUES {
            assert!(Microsteps::new(v).is_ok());
        }
    }

    #[test]
    fn test_microsteps_invalid_values() {
        assert!(Microsteps::new(0).is_err());
        assert!(Microsteps::new(3).is_err());
        assert!(Microsteps::new(64).is_err());
        assert!(Microsteps::new(256).is_err());
    }

    #[test]
    fn test_rounding_ties_away_from_zero() {
        assert_eq!(Steps::round_from(2.5), Steps(3));
        assert_eq!(Steps::round_from(-2.5), Steps(-3));
        assert_eq!(Steps::round_from(2.49), Steps(2));
        assert_eq!(Steps::round_from(-0.4), Steps(0));
    }

    #[test]
    fn test_wire_range() {
        assert_eq!(Steps(-6400).to_wire(), Ok(-6400));
        assert_eq!(
            Steps(i64::from(i32::MAX) + 1).to_wire(),
            Err(ConfigError::PositionOutOfRange(i64::from(i32::MAX) + 1))
        );
    }

    #[test]
    fn test_distance_unit() {
        assert_eq!(Distance::from(12.5f32.millimeters()).unit(), Unit::Millimeters);
        assert_eq!(Distance::from(Steps(10)).unit(), Unit::Steps);
    }
}
