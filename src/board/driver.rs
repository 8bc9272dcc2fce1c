//! Stepper board driver.
//!
//! Generic over an embedded-hal 1.0 I2C bus and delay provider. Holds the
//! host-side configuration store and motion state for the board's three axes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::units::{Distance, Microsteps, Millimeters, Rate, Revolutions, Steps, Unit};
use crate::config::{AxisConfig, AxisId, BoardAddress, BoardConfig, WaitConfig, AXES_PER_BOARD};
use crate::config::axis::validate_scale_factor;
use crate::error::{ConfigError, Result};
use crate::protocol::{payload, Opcode, Payload, Response, BOARD_WIDE};
use crate::transport::Transport;

use super::builder::StepperBoardBuilder;
use super::state::AxisState;
use super::status::StepperStatus;

/// Host-side record of one axis.
#[derive(Debug, Clone)]
pub(crate) struct Axis {
    pub(crate) config: AxisConfig,
    pub(crate) state: AxisState,
    /// Last position read from or written to the board. `None` while a move
    /// may have changed it.
    pub(crate) position: Option<Steps>,
}

impl Axis {
    fn new(axis: AxisId) -> Self {
        Self {
            config: AxisConfig::new(axis),
            state: AxisState::Idle,
            position: None,
        }
    }
}

/// Driver for one stepper controller board.
///
/// Generic over:
/// - `BUS`: I2C bus the board sits on (must implement `I2c`)
/// - `DELAY`: Delay provider for response turnaround and polling (must implement `DelayNs`)
///
/// Every operation takes `&mut self`, so only one command per board is ever
/// outstanding.
pub struct StepperBoard<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    /// Command channel (owns the bus).
    pub(crate) transport: Transport<BUS, DELAY>,

    /// Jumper-selected board number.
    address: BoardAddress,

    /// Board name for logging/debugging.
    name: heapless::String<32>,

    /// Polling behavior of blocking waits.
    pub(crate) wait: WaitConfig,

    /// Per-axis configuration store and state.
    pub(crate) axes: [Axis; AXES_PER_BOARD],
}

impl<BUS, DELAY> StepperBoard<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    /// Create a builder.
    pub fn builder() -> StepperBoardBuilder<BUS, DELAY> {
        StepperBoardBuilder::new()
    }

    pub(crate) fn new(
        transport: Transport<BUS, DELAY>,
        address: BoardAddress,
        name: heapless::String<32>,
        wait: WaitConfig,
    ) -> Self {
        Self {
            transport,
            address,
            name,
            wait,
            axes: AxisId::ALL.map(Axis::new),
        }
    }

    /// Get the board name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get the board address.
    #[inline]
    pub fn address(&self) -> BoardAddress {
        self.address
    }

    /// Get the blocking wait settings.
    #[inline]
    pub fn wait_config(&self) -> WaitConfig {
        self.wait
    }

    /// Change the blocking wait settings.
    pub fn set_wait_config(&mut self, wait: WaitConfig) {
        self.wait = wait;
    }

    /// Number of failed bus attempts since this handle was created.
    ///
    /// Local read, nothing is transmitted.
    #[inline]
    pub fn comm_error_count(&self) -> u32 {
        self.transport.error_count()
    }

    /// Configuration store entry of one axis.
    pub fn axis_config(&self, axis: u8) -> Result<&AxisConfig> {
        Ok(&self.axis(axis)?.config)
    }

    /// Motion state of one axis.
    pub fn axis_state(&self, axis: u8) -> Result<AxisState> {
        Ok(self.axis(axis)?.state)
    }

    /// Last position acknowledged by the board, if still valid.
    ///
    /// Issuing a move invalidates the cached position until it is read again.
    pub fn last_known_position(&self, axis: u8) -> Result<Option<Steps>> {
        Ok(self.axis(axis)?.position)
    }

    /// Give back the bus and delay provider.
    pub fn release(self) -> (BUS, DELAY) {
        self.transport.release()
    }

    pub(crate) fn axis(&self, axis: u8) -> Result<&Axis> {
        let id = AxisId::new(axis)?;
        Ok(&self.axes[id.index()])
    }

    pub(crate) fn axis_mut(&mut self, axis: u8) -> Result<&mut Axis> {
        let id = AxisId::new(axis)?;
        Ok(&mut self.axes[id.index()])
    }

    pub(crate) fn send(&mut self, opcode: Opcode, axis: u8, payload: Payload) -> Result<Response> {
        self.transport.send_command(self.address, opcode, axis, payload)
    }

    // =========================================================================
    // Status / diagnostics
    // =========================================================================

    /// Check that the board answers.
    pub fn ping(&mut self) -> Result<()> {
        self.send(Opcode::Ping, BOARD_WIDE, Payload::new())?;
        Ok(())
    }

    /// Reset the board to its power-on defaults.
    ///
    /// Board-side values in the configuration store are reset to match; the
    /// host-only scale factors and the error counter are kept. Cached
    /// positions are dropped.
    pub fn initialize(&mut self) -> Result<()> {
        self.send(Opcode::Initialize, BOARD_WIDE, Payload::new())?;

        for axis in self.axes.iter_mut() {
            axis.config.reset_board_values();
            axis.state = AxisState::Idle;
            axis.position = None;
        }

        info!("board {} initialized", self.address.value());
        Ok(())
    }

    /// Read the status flags of one axis.
    ///
    /// A moving axis reported stopped becomes idle.
    pub fn get_stepper_status(&mut self, axis: u8) -> Result<StepperStatus> {
        let id = AxisId::new(axis)?;
        let response = self.send(Opcode::GetStepperStatus, id.value(), Payload::new())?;
        let status = StepperStatus::from_flags(response.reader().u8()?);
        if status.stopped {
            self.settle(axis);
        }
        Ok(status)
    }

    // =========================================================================
    // Configuration store
    // =========================================================================

    /// Energize or release every driver on the board.
    pub fn enable_motors(&mut self, enabled: bool) -> Result<()> {
        self.send(
            Opcode::EnableMotors,
            BOARD_WIDE,
            payload(&[&[u8::from(enabled)]])?,
        )?;

        for axis in self.axes.iter_mut() {
            axis.config.enabled = enabled;
        }
        Ok(())
    }

    /// Set the microstep divisor (1, 2, 4, 8, 16 or 32).
    ///
    /// Microstepping is selected board-wide, so the divisor is recorded on
    /// every axis.
    pub fn set_microstepping(&mut self, microsteps: u16) -> Result<()> {
        let microsteps = Microsteps::new(microsteps)?;
        // Largest valid divisor is 32
        let value = microsteps.value() as u8;
        self.send(Opcode::SetMicrostepping, BOARD_WIDE, payload(&[&[value]])?)?;

        for axis in self.axes.iter_mut() {
            axis.config.microsteps = microsteps;
        }
        Ok(())
    }

    /// Set steps per millimeter of linear travel (host only, nothing is sent).
    pub fn set_steps_per_millimeter(&mut self, axis: u8, steps_per_millimeter: f32) -> Result<()> {
        let factor = validate_scale_factor(steps_per_millimeter)?;
        self.axis_mut(axis)?.config.steps_per_millimeter = Some(factor);
        Ok(())
    }

    /// Set steps per output revolution (host only, nothing is sent).
    pub fn set_steps_per_revolution(&mut self, axis: u8, steps_per_revolution: f32) -> Result<()> {
        let factor = validate_scale_factor(steps_per_revolution)?;
        self.axis_mut(axis)?.config.steps_per_revolution = Some(factor);
        Ok(())
    }

    /// Set the cruise speed of one axis.
    pub fn set_speed(&mut self, axis: u8, speed: Rate) -> Result<()> {
        if !(speed.value.is_finite() && speed.value > 0.0) {
            return Err(ConfigError::InvalidSpeed(speed.value).into());
        }
        let steps_per_sec = self.axis(axis)?.config.rate_to_steps(speed)?;
        if !steps_per_sec.is_finite() {
            return Err(ConfigError::InvalidSpeed(steps_per_sec).into());
        }

        self.send(Opcode::SetSpeed, axis, payload(&[&steps_per_sec.to_le_bytes()])?)?;
        self.axis_mut(axis)?.config.speed_steps_per_sec = steps_per_sec;
        Ok(())
    }

    /// Set the speed in steps per second.
    pub fn set_speed_in_steps_per_second(&mut self, axis: u8, speed: f32) -> Result<()> {
        self.set_speed(axis, Rate::steps(speed))
    }

    /// Set the speed in millimeters per second.
    pub fn set_speed_in_millimeters_per_second(&mut self, axis: u8, speed: f32) -> Result<()> {
        self.set_speed(axis, Rate::millimeters(speed))
    }

    /// Set the speed in revolutions per second.
    pub fn set_speed_in_revolutions_per_second(&mut self, axis: u8, speed: f32) -> Result<()> {
        self.set_speed(axis, Rate::revolutions(speed))
    }

    /// Set the acceleration (and deceleration) of one axis.
    pub fn set_acceleration(&mut self, axis: u8, acceleration: Rate) -> Result<()> {
        if !(acceleration.value.is_finite() && acceleration.value > 0.0) {
            return Err(ConfigError::InvalidAcceleration(acceleration.value).into());
        }
        let steps_per_sec2 = self.axis(axis)?.config.rate_to_steps(acceleration)?;
        if !steps_per_sec2.is_finite() {
            return Err(ConfigError::InvalidAcceleration(steps_per_sec2).into());
        }

        self.send(
            Opcode::SetAcceleration,
            axis,
            payload(&[&steps_per_sec2.to_le_bytes()])?,
        )?;
        self.axis_mut(axis)?.config.acceleration_steps_per_sec2 = steps_per_sec2;
        Ok(())
    }

    /// Set the acceleration in steps per second squared.
    pub fn set_acceleration_in_steps_per_second_per_second(
        &mut self,
        axis: u8,
        acceleration: f32,
    ) -> Result<()> {
        self.set_acceleration(axis, Rate::steps(acceleration))
    }

    /// Set the acceleration in millimeters per second squared.
    pub fn set_acceleration_in_millimeters_per_second_per_second(
        &mut self,
        axis: u8,
        acceleration: f32,
    ) -> Result<()> {
        self.set_acceleration(axis, Rate::millimeters(acceleration))
    }

    /// Set the acceleration in revolutions per second squared.
    pub fn set_acceleration_in_revolutions_per_second_per_second(
        &mut self,
        axis: u8,
        acceleration: f32,
    ) -> Result<()> {
        self.set_acceleration(axis, Rate::revolutions(acceleration))
    }

    /// Redefine the current position of one axis without moving it.
    ///
    /// Clears a homing fault.
    pub fn set_current_position(&mut self, axis: u8, position: Distance) -> Result<()> {
        let steps = self.axis(axis)?.config.distance_to_steps(position)?;
        let wire = steps.to_wire()?;

        self.send(Opcode::SetCurrentPosition, axis, payload(&[&wire.to_le_bytes()])?)?;

        let record = self.axis_mut(axis)?;
        record.position = Some(steps);
        if record.state == AxisState::Fault {
            record.state = AxisState::Idle;
        }
        Ok(())
    }

    /// Redefine the current position in steps.
    pub fn set_current_position_in_steps(&mut self, axis: u8, position: i64) -> Result<()> {
        self.set_current_position(axis, Distance::Steps(Steps(position)))
    }

    /// Redefine the current position in millimeters.
    pub fn set_current_position_in_millimeters(&mut self, axis: u8, position: f32) -> Result<()> {
        self.set_current_position(axis, Distance::Millimeters(Millimeters(position)))
    }

    /// Redefine the current position in revolutions.
    pub fn set_current_position_in_revolutions(&mut self, axis: u8, position: f32) -> Result<()> {
        self.set_current_position(axis, Distance::Revolutions(Revolutions(position)))
    }

    /// Push a board description to the board.
    ///
    /// Scale factors are stored first so that every later value is accepted
    /// in steps. Microstepping, per-axis speed and acceleration follow, then
    /// the drivers are energized if `enabled` is set.
    pub fn apply_config(&mut self, config: &BoardConfig) -> Result<()> {
        for settings in config.axes.iter() {
            let axis = settings.axis.value();
            if let Some(factor) = settings.steps_per_millimeter {
                self.set_steps_per_millimeter(axis, factor)?;
            }
            if let Some(factor) = settings.steps_per_revolution {
                self.set_steps_per_revolution(axis, factor)?;
            }
        }

        if let Some(microsteps) = config.microstepping {
            self.set_microstepping(microsteps.value())?;
        }

        for settings in config.axes.iter() {
            let axis = settings.axis.value();
            if let Some(speed) = settings.speed {
                self.set_speed(axis, Rate::steps(speed))?;
            }
            if let Some(acceleration) = settings.acceleration {
                self.set_acceleration(axis, Rate::steps(acceleration))?;
            }
        }

        if config.enabled {
            self.enable_motors(true)?;
        }

        debug!("board {} configuration applied", self.address.value());
        Ok(())
    }

    /// Convert a position or speed read back in steps to `unit`.
    pub(crate) fn steps_to(&self, axis: u8, steps: Steps, unit: Unit) -> Result<f32> {
        Ok(self.axis(axis)?.config.steps_to(steps, unit)?)
    }
}
