//! Command opcodes and response status codes.

use crate::error::ProtocolError;

/// Command understood by the board firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Liveness check.
    Ping = 0x01,
    /// Reset the board to its defaults.
    Initialize = 0x02,
    /// Energize (1) or release (0) all drivers.
    EnableMotors = 0x03,
    /// Board-wide microstep divisor.
    SetMicrostepping = 0x04,
    /// Cruise speed in steps/sec.
    SetSpeed = 0x10,
    /// Acceleration in steps/sec².
    SetAcceleration = 0x11,
    /// Start a move to an absolute step position.
    MoveToAbsolutePosition = 0x20,
    /// Start a move by a signed step count.
    MoveToRelativePosition = 0x21,
    /// Start a home sensor search.
    MoveToHome = 0x22,
    /// Redefine the current position.
    SetCurrentPosition = 0x30,
    /// Read the current position in steps.
    GetCurrentPosition = 0x31,
    /// Read the current velocity in steps/sec.
    GetCurrentVelocity = 0x32,
    /// Read the status flags of one axis.
    GetStepperStatus = 0x33,
    /// Read whether the last move of one axis has finished.
    GetMotionComplete = 0x34,
    /// Read whether every axis is stopped.
    GetAllMotorsStopped = 0x35,
    /// Stop immediately, without deceleration.
    EmergencyStop = 0x40,
    /// Stop using the configured deceleration.
    DecelerateToStop = 0x41,
}

impl Opcode {
    /// Every opcode, in wire order.
    pub const ALL: [Opcode; 17] = [
        Opcode::Ping,
        Opcode::Initialize,
        Opcode::EnableMotors,
        Opcode::SetMicrostepping,
        Opcode::SetSpeed,
        Opcode::SetAcceleration,
        Opcode::MoveToAbsolutePosition,
        Opcode::MoveToRelativePosition,
        Opcode::MoveToHome,
        Opcode::SetCurrentPosition,
        Opcode::GetCurrentPosition,
        Opcode::GetCurrentVelocity,
        Opcode::GetStepperStatus,
        Opcode::GetMotionComplete,
        Opcode::GetAllMotorsStopped,
        Opcode::EmergencyStop,
        Opcode::DecelerateToStop,
    ];

    /// Raw opcode byte.
    #[inline]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Length of the payload the board returns for this command.
    pub const fn response_len(self) -> usize {
        match self {
            Opcode::GetCurrentPosition | Opcode::GetCurrentVelocity => 4,
            Opcode::GetStepperStatus | Opcode::GetMotionComplete | Opcode::GetAllMotorsStopped => 1,
            _ => 0,
        }
    }

    /// Whether the command changes motor or board state.
    ///
    /// Retrying these is not idempotent when an acknowledgement is lost.
    pub const fn has_side_effects(self) -> bool {
        !matches!(
            self,
            Opcode::Ping
                | Opcode::GetCurrentPosition
                | Opcode::GetCurrentVelocity
                | Opcode::GetStepperStatus
                | Opcode::GetMotionComplete
                | Opcode::GetAllMotorsStopped
        )
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.value() == value)
            .ok_or(ProtocolError::UnknownOpcode(value))
    }
}

/// Status byte at the head of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Command accepted.
    Ok = 0x00,
    /// Board not ready; the command was not executed.
    Busy = 0x01,
    /// Arguments out of range for the firmware.
    Rejected = 0x02,
    /// Opcode not implemented by the firmware.
    UnknownCommand = 0x03,
}

impl Status {
    /// Raw status byte.
    #[inline]
    pub const fn value(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Status::Ok),
            0x01 => Ok(Status::Busy),
            0x02 => Ok(Status::Rejected),
            0x03 => Ok(Status::UnknownCommand),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }
}
