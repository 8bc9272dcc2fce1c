//! Error types for stepper-board library.
//!
//! Provides unified error handling across configuration, bus transport,
//! frame decoding and motion control.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

use crate::config::units::Unit;
use crate::protocol::{Opcode, Status};

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-board operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid parameter or configuration, detected before any transmission
    Config(ConfigError),
    /// Board did not answer after all attempts
    Transport(TransportError),
    /// Malformed frame or command rejected by the board
    Protocol(ProtocolError),
    /// Motion could not complete as requested
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep value (must be 1, 2, 4, 8, 16 or 32)
    InvalidMicrosteps(u16),
    /// Board address outside 0-3
    InvalidBoardAddress(u8),
    /// Axis index outside 0-2
    InvalidAxis(u8),
    /// Conversion requested for a unit whose scale factor was never set
    ScaleFactorNotSet {
        /// Axis index
        axis: u8,
        /// Unit that has no scale factor
        unit: Unit,
    },
    /// Scale factor must be finite and > 0
    InvalidScaleFactor(f32),
    /// Speed must be finite and > 0
    InvalidSpeed(f32),
    /// Acceleration must be finite and > 0
    InvalidAcceleration(f32),
    /// Distance must be finite (and > 0 where a magnitude is expected)
    InvalidDistance(f32),
    /// Position in steps does not fit the wire format
    PositionOutOfRange(i64),
    /// Retry attempts must be >= 1
    InvalidMaxAttempts(u8),
    /// Poll interval must be >= 1 ms
    InvalidPollInterval(u32),
    /// Two boards share the same address
    DuplicateBoardAddress(u8),
    /// An axis is configured twice on the same board
    DuplicateAxis {
        /// Board name
        board: heapless::String<32>,
        /// Axis index
        axis: u8,
    },
    /// Board name not found in configuration
    BoardNotFound(heapless::String<32>),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Transport errors, after the retry budget is spent.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No valid response within the configured number of attempts
    RetriesExhausted {
        /// Command that was being sent
        opcode: Opcode,
        /// Attempts made
        attempts: u8,
        /// Why the last attempt failed
        last_fault: LinkFault,
    },
}

/// Cause of a single failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkFault {
    /// Bus-level failure (NACK, arbitration loss, timeout)
    Bus(ErrorKind),
    /// Board answered but was not ready
    Busy,
    /// Response frame was malformed
    Frame(ProtocolError),
}

/// Frame and protocol errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Output buffer cannot hold the frame
    BufferTooSmall,
    /// Payload exceeds the maximum frame payload
    PayloadTooLarge(usize),
    /// Frame length disagrees with its header
    LengthMismatch {
        /// Expected length in bytes
        expected: usize,
        /// Received length in bytes
        actual: usize,
    },
    /// CRC over the frame does not match
    BadChecksum {
        /// CRC carried by the frame
        received: u16,
        /// CRC computed over the frame
        computed: u16,
    },
    /// Response answers a different request
    SequenceMismatch {
        /// Sequence number sent
        expected: u8,
        /// Sequence number echoed
        actual: u8,
    },
    /// Response echoes a different opcode
    OpcodeMismatch {
        /// Opcode sent
        expected: u8,
        /// Opcode echoed
        actual: u8,
    },
    /// Opcode byte not known to this driver
    UnknownOpcode(u8),
    /// Status byte not known to this driver
    UnknownStatus(u8),
    /// Board refused the command
    Rejected {
        /// Command that was refused
        opcode: Opcode,
        /// Status returned by the board
        status: Status,
    },
}

/// Motion errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Homing search ended without the home sensor triggering
    HomeNotFound {
        /// Axis index
        axis: u8,
    },
    /// Wait deadline elapsed before the motors stopped
    WaitTimeout {
        /// Axis index, `None` when waiting on all axes
        axis: Option<u8>,
        /// Accumulated poll delay in milliseconds
        waited_ms: u32,
    },
    /// Direction toward home must be +1 or -1
    InvalidDirection(i8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrosteps(v) => {
                write!(f, "Invalid microsteps: {}. Valid values: 1, 2, 4, 8, 16, 32", v)
            }
            ConfigError::InvalidBoardAddress(a) => {
                write!(f, "Invalid board address: {}. Must be 0-3", a)
            }
            ConfigError::InvalidAxis(a) => write!(f, "Invalid axis: {}. Must be 0-2", a),
            ConfigError::ScaleFactorNotSet { axis, unit } => {
                write!(f, "Axis {} has no scale factor for {}", axis, unit)
            }
            ConfigError::InvalidScaleFactor(v) => write!(f, "Invalid scale factor: {}. Must be > 0", v),
            ConfigError::InvalidSpeed(v) => write!(f, "Invalid speed: {}. Must be > 0", v),
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidDistance(v) => write!(f, "Invalid distance: {}", v),
            ConfigError::PositionOutOfRange(v) => {
                write!(f, "Position {} steps does not fit in 32 bits", v)
            }
            ConfigError::InvalidMaxAttempts(v) => write!(f, "Invalid max attempts: {}. Must be >= 1", v),
            ConfigError::InvalidPollInterval(v) => {
                write!(f, "Invalid poll interval: {} ms. Must be >= 1", v)
            }
            ConfigError::DuplicateBoardAddress(a) => write!(f, "Duplicate board address: {}", a),
            ConfigError::DuplicateAxis { board, axis } => {
                write!(f, "Axis {} configured twice on board '{}'", axis, board)
            }
            ConfigError::BoardNotFound(name) => write!(f, "Board '{}' not found", name),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::RetriesExhausted {
                opcode,
                attempts,
                last_fault,
            } => write!(
                f,
                "{:?} failed after {} attempts, last fault: {}",
                opcode, attempts, last_fault
            ),
        }
    }
}

impl fmt::Display for LinkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkFault::Bus(kind) => write!(f, "bus error ({:?})", kind),
            LinkFault::Busy => write!(f, "board busy"),
            LinkFault::Frame(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::BufferTooSmall => write!(f, "Frame buffer too small"),
            ProtocolError::PayloadTooLarge(len) => write!(f, "Payload of {} bytes too large", len),
            ProtocolError::LengthMismatch { expected, actual } => {
                write!(f, "Frame length {} does not match expected {}", actual, expected)
            }
            ProtocolError::BadChecksum { received, computed } => {
                write!(f, "Checksum mismatch: received {:#06x}, computed {:#06x}", received, computed)
            }
            ProtocolError::SequenceMismatch { expected, actual } => {
                write!(f, "Sequence mismatch: sent {}, echoed {}", expected, actual)
            }
            ProtocolError::OpcodeMismatch { expected, actual } => {
                write!(f, "Opcode mismatch: sent {:#04x}, echoed {:#04x}", expected, actual)
            }
            ProtocolError::UnknownOpcode(op) => write!(f, "Unknown opcode {:#04x}", op),
            ProtocolError::UnknownStatus(s) => write!(f, "Unknown status {:#04x}", s),
            ProtocolError::Rejected { opcode, status } => {
                write!(f, "Board rejected {:?} with status {:?}", opcode, status)
            }
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::HomeNotFound { axis } => {
                write!(f, "Axis {} reached its maximum homing distance without finding home", axis)
            }
            MotionError::WaitTimeout {
                axis: Some(axis),
                waited_ms,
            } => write!(f, "Axis {} still moving after {} ms", axis, waited_ms),
            MotionError::WaitTimeout {
                axis: None,
                waited_ms,
            } => write!(f, "Motors still moving after {} ms", waited_ms),
            MotionError::InvalidDirection(d) => {
                write!(f, "Invalid direction {}. Must be 1 or -1", d)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<ProtocolError> for LinkFault {
    fn from(e: ProtocolError) -> Self {
        LinkFault::Frame(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
