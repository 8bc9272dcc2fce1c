//! Motion requests.

use crate::config::units::{Distance, Rate};
use crate::error::MotionError;

/// Direction of axis travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Increasing step count.
    Positive,
    /// Decreasing step count.
    Negative,
}

impl Direction {
    /// Direction from a `+1`/`-1` sign.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::InvalidDirection` for any other value.
    pub fn from_sign(sign: i8) -> Result<Self, MotionError> {
        match sign {
            1 => Ok(Direction::Positive),
            -1 => Ok(Direction::Negative),
            other => Err(MotionError::InvalidDirection(other)),
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

/// Where a move ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Absolute position from the origin.
    Absolute(Distance),
    /// Displacement from the current position.
    Relative(Distance),
}

impl Target {
    /// Distance carried by the target.
    pub fn distance(&self) -> Distance {
        match self {
            Target::Absolute(d) | Target::Relative(d) => *d,
        }
    }
}

/// A single-axis move, consumed by `StepperBoard::execute`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRequest {
    /// Move target.
    pub target: Target,
    /// Block until the axis stops.
    pub wait: bool,
}

impl MotionRequest {
    /// Move to an absolute position.
    pub fn absolute(position: impl Into<Distance>, wait: bool) -> Self {
        Self {
            target: Target::Absolute(position.into()),
            wait,
        }
    }

    /// Move by a displacement.
    pub fn relative(delta: impl Into<Distance>, wait: bool) -> Self {
        Self {
            target: Target::Relative(delta.into()),
            wait,
        }
    }
}

/// A search for the home sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingRequest {
    /// Direction to travel toward home.
    pub direction: Direction,
    /// Search speed.
    pub speed: Rate,
    /// Give up after travelling this far (magnitude).
    pub max_distance: Distance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::{Steps, UnitExt};

    #[test]
    fn test_direction_from_sign() {
        assert_eq!(Direction::from_sign(1), Ok(Direction::Positive));
        assert_eq!(Direction::from_sign(-1), Ok(Direction::Negative));
        assert_eq!(Direction::from_sign(0), Err(MotionError::InvalidDirection(0)));
        assert_eq!(Direction::Negative.sign(), -1);
    }

    #[test]
    fn test_request_constructors() {
        let request = MotionRequest::relative(Steps(-400), true);
        assert_eq!(request.target, Target::Relative(Distance::Steps(Steps(-400))));
        assert!(request.wait);

        let request = MotionRequest::absolute(25.0f32.millimeters(), false);
        assert_eq!(request.target.distance(), Distance::Millimeters(25.0f32.millimeters()));
    }
}
