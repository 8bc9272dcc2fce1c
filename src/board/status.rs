//! Stepper status flags.

const STOPPED: u8 = 1 << 0;
const ENABLED: u8 = 1 << 1;
const AT_HOME: u8 = 1 << 2;

/// Snapshot of one axis reported by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepperStatus {
    /// The axis is not moving.
    pub stopped: bool,
    /// The driver is energized.
    pub enabled: bool,
    /// The home sensor is triggered.
    pub at_home: bool,
}

impl StepperStatus {
    /// Decode the flags byte.
    pub fn from_flags(flags: u8) -> Self {
        Self {
            stopped: flags & STOPPED != 0,
            enabled: flags & ENABLED != 0,
            at_home: flags & AT_HOME != 0,
        }
    }

    /// Encode as a flags byte.
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.stopped {
            flags |= STOPPED;
        }
        if self.enabled {
            flags |= ENABLED;
        }
        if self.at_home {
            flags |= AT_HOME;
        }
        flags
    }
}
