//! Request and response frames.
//!
//! Request: `[opcode, seq, axis, len, payload.., crc_lo, crc_hi]`.
//! Response: `[status, seq, opcode, len, payload.., crc_lo, crc_hi]`, where
//! `len` always equals [`Opcode::response_len`] so the host knows how many
//! bytes to read before decoding anything.

use heapless::Vec;

use crate::error::ProtocolError;

use super::crc::crc16_ccitt_false;
use super::opcode::{Opcode, Status};

/// Header bytes before the payload.
pub const HEADER_LEN: usize = 4;
/// Trailing checksum bytes.
pub const CRC_LEN: usize = 2;
/// Largest payload carried by any frame.
pub const MAX_PAYLOAD_LEN: usize = 12;
/// Largest frame on the wire.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN + CRC_LEN;
/// Axis byte for commands that address the whole board.
pub const BOARD_WIDE: u8 = 0xFF;

/// Frame payload buffer.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Concatenate little-endian fields into a payload.
pub fn payload(parts: &[&[u8]]) -> Result<Payload, ProtocolError> {
    let total: usize = parts.iter().map(|p| p.len()).sum();
    if total > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut out = Payload::new();
    for part in parts {
        out.extend_from_slice(part)
            .map_err(|_| ProtocolError::PayloadTooLarge(total))?;
    }
    Ok(out)
}

/// Command frame sent by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Command.
    pub opcode: Opcode,
    /// Sequence number echoed by the response.
    pub seq: u8,
    /// Axis index or [`BOARD_WIDE`].
    pub axis: u8,
    /// Little-endian arguments.
    pub payload: Payload,
}

impl Request {
    /// Encoded length of this request.
    #[inline]
    pub fn frame_len(&self) -> usize {
        HEADER_LEN + self.payload.len() + CRC_LEN
    }

    /// Encode into `out`, returning the number of bytes written.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, ProtocolError> {
        let len = self.frame_len();
        if out.len() < len {
            return Err(ProtocolError::BufferTooSmall);
        }

        out[0] = self.opcode.value();
        out[1] = self.seq;
        out[2] = self.axis;
        out[3] = self.payload.len() as u8;
        out[HEADER_LEN..HEADER_LEN + self.payload.len()].copy_from_slice(&self.payload);
        write_crc(&mut out[..len]);
        Ok(len)
    }

    /// Decode a request (board side).
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < HEADER_LEN + CRC_LEN {
            return Err(ProtocolError::LengthMismatch {
                expected: HEADER_LEN + CRC_LEN,
                actual: buf.len(),
            });
        }

        let payload_len = buf[3] as usize;
        let expected = HEADER_LEN + payload_len + CRC_LEN;
        if payload_len > MAX_PAYLOAD_LEN || buf.len() != expected {
            return Err(ProtocolError::LengthMismatch {
                expected,
                actual: buf.len(),
            });
        }
        check_crc(buf)?;

        let opcode = Opcode::try_from(buf[0])?;
        let payload = payload(&[&buf[HEADER_LEN..HEADER_LEN + payload_len]])?;

        Ok(Self {
            opcode,
            seq: buf[1],
            axis: buf[2],
            payload,
        })
    }
}

/// Reply frame sent by the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Outcome of the command.
    pub status: Status,
    /// Sequence number of the request being answered.
    pub seq: u8,
    /// Opcode of the request being answered.
    pub opcode: Opcode,
    /// Returned value, zero-filled unless `status` is `Ok`.
    pub payload: Payload,
}

impl Response {
    /// Length of the response frame for `opcode`.
    #[inline]
    pub const fn frame_len(opcode: Opcode) -> usize {
        HEADER_LEN + opcode.response_len() + CRC_LEN
    }

    /// Build a response carrying `status` and a zero-filled payload.
    pub fn with_status(request: &Request, status: Status) -> Self {
        let mut payload = Payload::new();
        // response_len never exceeds MAX_PAYLOAD_LEN
        let _ = payload.resize(request.opcode.response_len(), 0);
        Self {
            status,
            seq: request.seq,
            opcode: request.opcode,
            payload,
        }
    }

    /// Encode into `out` (board side), returning the number of bytes written.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, ProtocolError> {
        let expected_payload = self.opcode.response_len();
        if self.payload.len() != expected_payload {
            return Err(ProtocolError::LengthMismatch {
                expected: expected_payload,
                actual: self.payload.len(),
            });
        }
        let len = Self::frame_len(self.opcode);
        if out.len() < len {
            return Err(ProtocolError::BufferTooSmall);
        }

        out[0] = self.status.value();
        out[1] = self.seq;
        out[2] = self.opcode.value();
        out[3] = self.payload.len() as u8;
        out[HEADER_LEN..HEADER_LEN + self.payload.len()].copy_from_slice(&self.payload);
        write_crc(&mut out[..len]);
        Ok(len)
    }

    /// Decode the response to a request carrying `opcode` and `seq`.
    ///
    /// The checksum is verified before any header field is trusted.
    pub fn decode(buf: &[u8], opcode: Opcode, seq: u8) -> Result<Self, ProtocolError> {
        let expected = Self::frame_len(opcode);
        if buf.len() != expected {
            return Err(ProtocolError::LengthMismatch {
                expected,
                actual: buf.len(),
            });
        }
        check_crc(buf)?;

        let status = Status::try_from(buf[0])?;
        if buf[1] != seq {
            return Err(ProtocolError::SequenceMismatch {
                expected: seq,
                actual: buf[1],
            });
        }
        if buf[2] != opcode.value() {
            return Err(ProtocolError::OpcodeMismatch {
                expected: opcode.value(),
                actual: buf[2],
            });
        }
        let payload_len = buf[3] as usize;
        if payload_len != opcode.response_len() {
            return Err(ProtocolError::LengthMismatch {
                expected: opcode.response_len(),
                actual: payload_len,
            });
        }

        Ok(Self {
            status,
            seq,
            opcode,
            payload: payload(&[&buf[HEADER_LEN..HEADER_LEN + payload_len]])?,
        })
    }

    /// Reader over the returned payload.
    #[inline]
    pub fn reader(&self) -> PayloadReader<'_> {
        PayloadReader::new(&self.payload)
    }
}

/// Sequential little-endian reader over a payload.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    /// Start reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(ProtocolError::LengthMismatch {
            expected: end,
            actual: self.bytes.len(),
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    /// Read one unsigned byte.
    pub fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take::<1>()?[0])
    }

    /// Read one signed byte.
    pub fn i8(&mut self) -> Result<i8, ProtocolError> {
        Ok(i8::from_le_bytes(self.take::<1>()?))
    }

    /// Read a little-endian `i32`.
    pub fn i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_le_bytes(self.take::<4>()?))
    }

    /// Read a little-endian `u32`.
    pub fn u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    /// Read a little-endian `f32`.
    pub fn f32(&mut self) -> Result<f32, ProtocolError> {
        Ok(f32::from_le_bytes(self.take::<4>()?))
    }
}

fn write_crc(frame: &mut [u8]) {
    let body = frame.len() - CRC_LEN;
    let crc = crc16_ccitt_false(&frame[..body]).to_le_bytes();
    frame[body] = crc[0];
    frame[body + 1] = crc[1];
}

fn check_crc(frame: &[u8]) -> Result<(), ProtocolError> {
    let body = frame.len() - CRC_LEN;
    let received = u16::from_le_bytes([frame[body], frame[body + 1]]);
    let computed = crc16_ccitt_false(&frame[..body]);
    if received != computed {
        return Err(ProtocolError::BadChecksum { received, computed });
    }
    Ok(())
}
