//! Protocol module for stepper-board.
//!
//! Wire format shared by the host driver and board-side implementations.

mod crc;
mod frame;
mod opcode;

pub use crc::crc16_ccitt_false;
pub use frame::{
    payload, Payload, PayloadReader, Request, Response, BOARD_WIDE, CRC_LEN, HEADER_LEN,
    MAX_FRAME_LEN, MAX_PAYLOAD_LEN,
};
pub use opcode::{Opcode, Status};

/// 7-bit bus address of board 0; board `n` answers at `BASE_BUS_ADDRESS + n`.
pub const BASE_BUS_ADDRESS: u8 = 0x20;
