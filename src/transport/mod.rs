//! Command/response transport with retry and error counting.
//!
//! One [`Transport`] owns the bus and delay provider shared by every command
//! sent to one board. Each command is attempted up to
//! [`TransportConfig::max_attempts`] times; every failed attempt bumps the
//! error counter by one.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};

use crate::config::{BoardAddress, TransportConfig};
use crate::error::{LinkFault, ProtocolError, Result, TransportError};
use crate::protocol::{Opcode, Payload, Request, Response, Status, MAX_FRAME_LEN};

/// Reliable command channel to boards on one bus.
#[derive(Debug)]
pub struct Transport<BUS, DELAY> {
    bus: BUS,
    delay: DELAY,
    config: TransportConfig,
    seq: u8,
    error_count: u32,
}

impl<BUS, DELAY> Transport<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    /// Create a transport over `bus`.
    pub fn new(bus: BUS, delay: DELAY, config: TransportConfig) -> Self {
        Self {
            bus,
            delay,
            config,
            seq: 0,
            error_count: 0,
        }
    }

    /// Retry settings in use.
    #[inline]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Number of failed attempts since this transport was created.
    #[inline]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Block for `ms` milliseconds on the transport's delay provider.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Give back the bus and delay provider.
    pub fn release(self) -> (BUS, DELAY) {
        (self.bus, self.delay)
    }

    /// Send one command and return the board's acknowledged response.
    ///
    /// # Errors
    ///
    /// - `TransportError::RetriesExhausted` if no attempt produced a valid,
    ///   non-busy response.
    /// - `ProtocolError::Rejected` if the board refused the command. Refusals
    ///   are valid replies and are neither retried nor counted.
    pub fn send_command(
        &mut self,
        board: BoardAddress,
        opcode: Opcode,
        axis: u8,
        payload: Payload,
    ) -> Result<Response> {
        let address = board.bus_address();
        let max_attempts = self.config.max_attempts.max(1);
        let mut request = Request {
            opcode,
            seq: self.seq,
            axis,
            payload,
        };
        let mut attempt = 0u8;

        loop {
            attempt += 1;
            request.seq = self.next_seq();
            trace!(
                "tx opcode={} seq={} axis={} board={}",
                opcode.value(),
                request.seq,
                axis,
                board.value()
            );

            let last_fault = match self.attempt(address, &request) {
                Ok(response) => {
                    return match response.status {
                        Status::Ok => Ok(response),
                        status => Err(ProtocolError::Rejected { opcode, status }.into()),
                    };
                }
                Err(fault) => fault,
            };

            self.error_count = self.error_count.saturating_add(1);

            if attempt >= max_attempts {
                error!(
                    "opcode {} to board {} failed after {} attempts",
                    opcode.value(),
                    board.value(),
                    attempt
                );
                return Err(TransportError::RetriesExhausted {
                    opcode,
                    attempts: attempt,
                    last_fault,
                }
                .into());
            }

            warn!(
                "opcode {} to board {} failed (attempt {}/{}), retrying",
                opcode.value(),
                board.value(),
                attempt,
                max_attempts
            );
            if opcode.has_side_effects() {
                // A lost acknowledgement means the board may run this twice
                debug!("re-sending opcode {} which is not idempotent", opcode.value());
            }
        }
    }

    fn next_seq(&mut self) -> u8 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    fn attempt(&mut self, address: u8, request: &Request) -> core::result::Result<Response, LinkFault> {
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = request.encode(&mut buf)?;
        self.bus
            .write(address, &buf[..len])
            .map_err(|e| LinkFault::Bus(e.kind()))?;

        self.delay.delay_us(self.config.response_delay_us);

        let len = Response::frame_len(request.opcode);
        self.bus
            .read(address, &mut buf[..len])
            .map_err(|e| LinkFault::Bus(e.kind()))?;

        let response = Response::decode(&buf[..len], request.opcode, request.seq)?;
        if response.status == Status::Busy {
            return Err(LinkFault::Busy);
        }
        Ok(response)
    }
}
