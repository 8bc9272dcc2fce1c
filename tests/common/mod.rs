//! Simulated stepper board for integration tests.
//!
//! Implements `embedded_hal::i2c::I2c`, decodes requests with the crate's own
//! codec and answers like the firmware would. Moves advance a fixed number of
//! steps each time the host polls status, and a home sensor can be placed at
//! a physical position per axis.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use stepper_board::protocol::{
    payload, Opcode, Payload, Request, Response, Status, BASE_BUS_ADDRESS, MAX_FRAME_LEN,
};
use stepper_board::{StepperBoard, TransportConfig, WaitConfig};

/// What goes wrong with the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Attempt goes through untouched.
    Pass,
    /// Request is NACKed and never reaches the firmware.
    Nack,
    /// Firmware answers Busy without executing.
    Busy,
    /// Firmware refuses the command.
    Reject,
    /// Command executes but the response is corrupted on the wire.
    CorruptResponse,
    /// Command executes but the response carries an old sequence number.
    StaleResponse,
    /// Command executes but the response read fails.
    DropResponse,
}

#[derive(Debug, Clone, Default)]
pub struct SimAxis {
    pub position: i64,
    pub target: i64,
    pub moving: bool,
    pub homing: bool,
    pub speed: f32,
    pub acceleration: f32,
    /// Physical position of board position 0.
    pub origin: i64,
    /// Physical position of the home sensor.
    pub home_sensor: Option<i64>,
}

impl SimAxis {
    fn physical(&self) -> i64 {
        self.position + self.origin
    }

    fn at_home(&self) -> bool {
        self.home_sensor == Some(self.physical())
    }

    fn zero_here(&mut self) {
        self.origin = self.physical();
        self.position = 0;
        self.target = 0;
        self.moving = false;
        self.homing = false;
    }

    fn stop(&mut self) {
        self.target = self.position;
        self.moving = false;
        self.homing = false;
    }

    fn advance(&mut self, steps: i64) {
        if !self.moving {
            return;
        }
        let dir = (self.target - self.position).signum();
        let mut remaining = steps;
        while remaining > 0 && self.position != self.target {
            self.position += dir;
            remaining -= 1;
            if self.homing && self.at_home() {
                self.zero_here();
                return;
            }
        }
        if self.position == self.target {
            self.moving = false;
            self.homing = false;
        }
    }
}

#[derive(Debug)]
pub struct SimState {
    pub bus_address: u8,
    pub axes: [SimAxis; 3],
    pub microstepping: u8,
    pub enabled: bool,
    pub steps_per_poll: i64,
    /// Requests that reached the firmware, in order.
    pub log: Vec<Request>,
    pub faults: VecDeque<Fault>,
    pending: Option<Vec<u8>>,
}

impl SimState {
    fn new(board: u8) -> Self {
        let mut state = Self {
            bus_address: BASE_BUS_ADDRESS + board,
            axes: Default::default(),
            microstepping: 1,
            enabled: false,
            steps_per_poll: 400,
            log: Vec::new(),
            faults: VecDeque::new(),
            pending: None,
        };
        state.reset();
        state
    }

    fn reset(&mut self) {
        self.microstepping = 1;
        self.enabled = false;
        for axis in self.axes.iter_mut() {
            axis.stop();
            axis.speed = 200.0;
            axis.acceleration = 200.0;
        }
    }

    fn handle_write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        self.pending = None;
        let fault = self.faults.pop_front();
        if fault == Some(Fault::Nack) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }

        let request = match Request::decode(bytes) {
            Ok(request) => request,
            // Garbled request, firmware stays silent
            Err(_) => return Ok(()),
        };
        self.log.push(request.clone());

        let mut response = match fault {
            Some(Fault::Busy) => Response::with_status(&request, Status::Busy),
            Some(Fault::Reject) => Response::with_status(&request, Status::Rejected),
            _ => self.execute(&request),
        };
        if fault == Some(Fault::StaleResponse) {
            response.seq = response.seq.wrapping_sub(1);
        }

        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = response.encode(&mut buf).map_err(|_| ErrorKind::Other)?;
        let mut frame = buf[..len].to_vec();
        match fault {
            Some(Fault::CorruptResponse) => frame[1] ^= 0x55,
            Some(Fault::DropResponse) => return Ok(()),
            _ => {}
        }
        self.pending = Some(frame);
        Ok(())
    }

    fn handle_read(&mut self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        match self.pending.take() {
            Some(frame) if frame.len() == buf.len() => {
                buf.copy_from_slice(&frame);
                Ok(())
            }
            _ => Err(ErrorKind::Other),
        }
    }

    fn execute(&mut self, request: &Request) -> Response {
        let mut response = Response::with_status(request, Status::Ok);
        let reject = Response::with_status(request, Status::Rejected);
        let mut reader = stepper_board::protocol::PayloadReader::new(&request.payload);
        let axis = request.axis as usize;
        let steps_per_poll = self.steps_per_poll;

        let board_wide = matches!(
            request.opcode,
            Opcode::Ping
                | Opcode::Initialize
                | Opcode::EnableMotors
                | Opcode::SetMicrostepping
                | Opcode::GetAllMotorsStopped
        );
        if !board_wide && axis >= 3 {
            return reject;
        }

        match request.opcode {
            Opcode::Ping => {}
            Opcode::Initialize => self.reset(),
            Opcode::EnableMotors => match reader.u8() {
                Ok(v) => self.enabled = v != 0,
                Err(_) => return reject,
            },
            Opcode::SetMicrostepping => match reader.u8() {
                Ok(v) if [1, 2, 4, 8, 16, 32].contains(&v) => self.microstepping = v,
                _ => return reject,
            },
            Opcode::SetSpeed => match reader.f32() {
                Ok(v) if v > 0.0 => self.axes[axis].speed = v,
                _ => return reject,
            },
            Opcode::SetAcceleration => match reader.f32() {
                Ok(v) if v > 0.0 => self.axes[axis].acceleration = v,
                _ => return reject,
            },
            Opcode::MoveToAbsolutePosition | Opcode::MoveToRelativePosition => {
                let value = match reader.i32() {
                    Ok(v) => i64::from(v),
                    Err(_) => return reject,
                };
                let a = &mut self.axes[axis];
                a.target = if request.opcode == Opcode::MoveToAbsolutePosition {
                    value
                } else {
                    a.position + value
                };
                a.homing = false;
                a.moving = a.target != a.position;
            }
            Opcode::MoveToHome => {
                let (dir, speed, max) = match (reader.i8(), reader.f32(), reader.u32()) {
                    (Ok(d), Ok(s), Ok(m)) => (d, s, m),
                    _ => return reject,
                };
                if !(dir == 1 || dir == -1) || speed <= 0.0 || max == 0 {
                    return reject;
                }
                let a = &mut self.axes[axis];
                if a.at_home() {
                    a.zero_here();
                } else {
                    a.target = a.position + i64::from(dir) * i64::from(max);
                    a.moving = true;
                    a.homing = true;
                }
            }
            Opcode::SetCurrentPosition => match reader.i32() {
                Ok(v) => {
                    let a = &mut self.axes[axis];
                    let physical = a.physical();
                    a.position = i64::from(v);
                    a.target = a.position;
                    a.origin = physical - a.position;
                    a.moving = false;
                }
                Err(_) => return reject,
            },
            Opcode::GetCurrentPosition => {
                let pos = self.axes[axis].position as i32;
                response.payload = payload(&[&pos.to_le_bytes()]).unwrap_or_default();
            }
            Opcode::GetCurrentVelocity => {
                let a = &self.axes[axis];
                let velocity = if a.moving {
                    a.speed * (a.target - a.position).signum() as f32
                } else {
                    0.0
                };
                response.payload = payload(&[&velocity.to_le_bytes()]).unwrap_or_default();
            }
            Opcode::GetStepperStatus => {
                let a = &mut self.axes[axis];
                a.advance(steps_per_poll);
                let flags = u8::from(!a.moving)
                    | (u8::from(self.enabled) << 1)
                    | (u8::from(a.at_home()) << 2);
                response.payload = one_byte(flags);
            }
            Opcode::GetMotionComplete => {
                let a = &mut self.axes[axis];
                a.advance(steps_per_poll);
                response.payload = one_byte(u8::from(!a.moving));
            }
            Opcode::GetAllMotorsStopped => {
                for a in self.axes.iter_mut() {
                    a.advance(steps_per_poll);
                }
                let stopped = self.axes.iter().all(|a| !a.moving);
                response.payload = one_byte(u8::from(stopped));
            }
            Opcode::EmergencyStop => self.axes[axis].stop(),
            Opcode::DecelerateToStop => {
                let a = &mut self.axes[axis];
                a.advance(steps_per_poll / 4);
                a.stop();
            }
        }
        response
    }
}

fn one_byte(value: u8) -> Payload {
    payload(&[&[value]]).unwrap_or_default()
}

/// Cloneable handle onto one simulated board.
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBoard {
    pub fn new(board: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(board))),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn inject(&self, faults: &[Fault]) {
        self.state().faults.extend(faults.iter().copied());
    }

    pub fn position(&self, axis: usize) -> i64 {
        self.state().axes[axis].position
    }

    pub fn set_home_sensor(&self, axis: usize, physical: i64) {
        self.state().axes[axis].home_sensor = Some(physical);
    }

    pub fn set_steps_per_poll(&self, steps: i64) {
        self.state().steps_per_poll = steps;
    }

    pub fn request_count(&self) -> usize {
        self.state().log.len()
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        self.state().log.iter().map(|r| r.opcode).collect()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.state().log.last().cloned()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }
}

impl ErrorType for SimulatedBoard {
    type Error = ErrorKind;
}

impl I2c for SimulatedBoard {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state();
        if address != state.bus_address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => state.handle_write(&bytes[..])?,
                Operation::Read(buf) => state.handle_read(&mut buf[..])?,
            }
        }
        Ok(())
    }
}

/// Delay provider that returns immediately and counts requested time.
#[derive(Debug, Clone, Default)]
pub struct NoDelay {
    pub total_ns: Arc<Mutex<u64>>,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.lock().unwrap() += u64::from(ns);
    }
}

pub type SimBoard = StepperBoard<SimulatedBoard, NoDelay>;

/// Board 0 wired to a fresh simulator.
pub fn setup() -> (SimBoard, SimulatedBoard) {
    setup_with(0, TransportConfig::default(), WaitConfig::default())
}

pub fn setup_with(address: u8, transport: TransportConfig, wait: WaitConfig) -> (SimBoard, SimulatedBoard) {
    let sim = SimulatedBoard::new(address);
    let board = StepperBoard::builder()
        .bus(sim.clone())
        .delay(NoDelay::default())
        .address(address)
        .transport(transport)
        .wait(wait)
        .build()
        .unwrap();
    (board, sim)
}
