//! Motion commands, blocking waits and position/velocity readback.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::units::{Distance, Millimeters, Rate, Revolutions, Steps, Unit};
use crate::config::AxisId;
use crate::error::{ConfigError, MotionError, Result};
use crate::motion::{Direction, HomingRequest, MotionRequest, Target, WaitBudget};
use crate::protocol::{payload, Opcode, Payload, BOARD_WIDE};

use super::driver::StepperBoard;
use super::state::AxisState;

impl<BUS, DELAY> StepperBoard<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    /// Issue a move and optionally block until the axis stops.
    ///
    /// Every positional move goes through here. The target is converted to
    /// steps and range-checked before anything is sent. A homing fault is
    /// cleared once the board accepts the move.
    pub fn execute(&mut self, axis: u8, request: MotionRequest) -> Result<()> {
        let steps = self
            .axis(axis)?
            .config
            .distance_to_steps(request.target.distance())?;
        let wire = steps.to_wire()?;

        let opcode = match request.target {
            Target::Absolute(_) => Opcode::MoveToAbsolutePosition,
            Target::Relative(_) => Opcode::MoveToRelativePosition,
        };
        self.send(opcode, axis, payload(&[&wire.to_le_bytes()])?)?;

        let record = self.axis_mut(axis)?;
        record.state = AxisState::Moving;
        record.position = None;

        if request.wait {
            self.wait_until_motor_stops(axis)?;
        }
        Ok(())
    }

    /// Move to an absolute position in steps.
    pub fn move_to_absolute_position_in_steps(
        &mut self,
        axis: u8,
        position: i64,
        wait: bool,
    ) -> Result<()> {
        self.execute(axis, MotionRequest::absolute(Steps(position), wait))
    }

    /// Move to an absolute position in millimeters.
    pub fn move_to_absolute_position_in_millimeters(
        &mut self,
        axis: u8,
        position: f32,
        wait: bool,
    ) -> Result<()> {
        self.execute(axis, MotionRequest::absolute(Millimeters(position), wait))
    }

    /// Move to an absolute position in revolutions.
    pub fn move_to_absolute_position_in_revolutions(
        &mut self,
        axis: u8,
        position: f32,
        wait: bool,
    ) -> Result<()> {
        self.execute(axis, MotionRequest::absolute(Revolutions(position), wait))
    }

    /// Move by a signed number of steps.
    pub fn move_to_relative_position_in_steps(
        &mut self,
        axis: u8,
        delta: i64,
        wait: bool,
    ) -> Result<()> {
        self.execute(axis, MotionRequest::relative(Steps(delta), wait))
    }

    /// Move by a signed distance in millimeters.
    pub fn move_to_relative_position_in_millimeters(
        &mut self,
        axis: u8,
        delta: f32,
        wait: bool,
    ) -> Result<()> {
        self.execute(axis, MotionRequest::relative(Millimeters(delta), wait))
    }

    /// Move by a signed distance in revolutions.
    pub fn move_to_relative_position_in_revolutions(
        &mut self,
        axis: u8,
        delta: f32,
        wait: bool,
    ) -> Result<()> {
        self.execute(axis, MotionRequest::relative(Revolutions(delta), wait))
    }

    /// Search for the home sensor and block until the search ends.
    ///
    /// On success the board has zeroed the axis position. If the axis stops
    /// without the sensor triggering, the position is left where the search
    /// ended and the axis enters [`AxisState::Fault`]. A wait timeout or a
    /// transport failure during the search also leaves the axis in
    /// [`AxisState::Fault`].
    ///
    /// # Errors
    ///
    /// - `MotionError::HomeNotFound` if `max_distance` was travelled without
    ///   reaching home.
    /// - `ConfigError` if the speed or distance is not positive or cannot be
    ///   converted.
    pub fn home(&mut self, axis: u8, request: HomingRequest) -> Result<()> {
        self.begin_home(axis, request)?;
        let outcome = self.wait_until_motor_stops(axis);
        self.finish_home(axis, outcome)
    }

    /// Validate and send the search command; the axis enters `Homing`.
    pub(crate) fn begin_home(&mut self, axis: u8, request: HomingRequest) -> Result<()> {
        let id = AxisId::new(axis)?;
        if !(request.speed.value.is_finite() && request.speed.value > 0.0) {
            return Err(ConfigError::InvalidSpeed(request.speed.value).into());
        }

        let config = &self.axis(axis)?.config;
        let speed = config.rate_to_steps(request.speed)?;
        let max_steps = config.distance_to_steps(request.max_distance)?;
        if max_steps.value() <= 0 {
            return Err(ConfigError::InvalidDistance(max_steps.value() as f32).into());
        }
        let max_steps =
            u32::try_from(max_steps.value()).map_err(|_| ConfigError::PositionOutOfRange(max_steps.value()))?;

        self.send(
            Opcode::MoveToHome,
            id.value(),
            payload(&[
                &request.direction.sign().to_le_bytes(),
                &speed.to_le_bytes(),
                &max_steps.to_le_bytes(),
            ])?,
        )?;

        let record = self.axis_mut(axis)?;
        record.state = AxisState::Homing;
        record.position = None;
        Ok(())
    }

    /// Resolve a search once waiting for it ended with `waited`.
    ///
    /// Homing only ever exits to `Idle` or `Fault`.
    pub(crate) fn finish_home(&mut self, axis: u8, waited: Result<()>) -> Result<()> {
        let status = match waited.and_then(|()| self.get_stepper_status(axis)) {
            Ok(status) => status,
            Err(e) => {
                self.axis_mut(axis)?.state = AxisState::Fault;
                warn!("axis {} homing aborted", axis);
                return Err(e);
            }
        };

        let record = self.axis_mut(axis)?;
        if status.at_home {
            record.state = AxisState::Idle;
            record.position = Some(Steps(0));
            info!("axis {} homed", axis);
            Ok(())
        } else {
            record.state = AxisState::Fault;
            warn!("axis {} stopped without finding home", axis);
            Err(MotionError::HomeNotFound { axis }.into())
        }
    }

    fn home_with(
        &mut self,
        axis: u8,
        direction: i8,
        speed: Rate,
        max_distance: Distance,
    ) -> Result<()> {
        let request = HomingRequest {
            direction: Direction::from_sign(direction)?,
            speed,
            max_distance,
        };
        self.home(axis, request)
    }

    /// Home with speed in steps/sec and maximum travel in steps.
    pub fn move_to_home_in_steps(
        &mut self,
        axis: u8,
        direction: i8,
        speed: f32,
        max_distance: i64,
    ) -> Result<()> {
        self.home_with(axis, direction, Rate::steps(speed), Steps(max_distance).into())
    }

    /// Home with speed in mm/sec and maximum travel in millimeters.
    pub fn move_to_home_in_millimeters(
        &mut self,
        axis: u8,
        direction: i8,
        speed: f32,
        max_distance: f32,
    ) -> Result<()> {
        self.home_with(
            axis,
            direction,
            Rate::millimeters(speed),
            Millimeters(max_distance).into(),
        )
    }

    /// Home with speed in revolutions/sec and maximum travel in revolutions.
    pub fn move_to_home_in_revolutions(
        &mut self,
        axis: u8,
        direction: i8,
        speed: f32,
        max_distance: f32,
    ) -> Result<()> {
        self.home_with(
            axis,
            direction,
            Rate::revolutions(speed),
            Revolutions(max_distance).into(),
        )
    }

    // =========================================================================
    // Stopping
    // =========================================================================

    /// Stop one axis immediately, without deceleration.
    pub fn emergency_stop(&mut self, axis: u8) -> Result<()> {
        self.stop(axis, Opcode::EmergencyStop)
    }

    /// Stop one axis using its configured deceleration.
    ///
    /// Returns once the board accepted the command; the axis may still be
    /// decelerating.
    pub fn decelerate_to_a_stop(&mut self, axis: u8) -> Result<()> {
        self.stop(axis, Opcode::DecelerateToStop)
    }

    fn stop(&mut self, axis: u8, opcode: Opcode) -> Result<()> {
        let id = AxisId::new(axis)?;
        self.send(opcode, id.value(), Payload::new())?;

        let record = self.axis_mut(axis)?;
        record.state = AxisState::Idle;
        record.position = None;
        Ok(())
    }

    // =========================================================================
    // Motion queries and waits
    // =========================================================================

    /// Whether the last move of one axis has finished.
    ///
    /// A moving axis seen stopped becomes idle.
    pub fn get_motion_complete(&mut self, axis: u8) -> Result<bool> {
        let id = AxisId::new(axis)?;
        let response = self.send(Opcode::GetMotionComplete, id.value(), Payload::new())?;
        let complete = response.reader().u8()? != 0;
        if complete {
            self.settle(axis);
        }
        Ok(complete)
    }

    /// Whether every axis on the board is stopped.
    ///
    /// Nothing is sent besides the query. Moving axes become idle once the
    /// board reports all stopped.
    pub fn get_all_motors_stopped(&mut self) -> Result<bool> {
        let response = self.send(Opcode::GetAllMotorsStopped, BOARD_WIDE, Payload::new())?;
        let stopped = response.reader().u8()? != 0;
        if stopped {
            for axis in AxisId::all() {
                self.settle(axis.value());
            }
        }
        Ok(stopped)
    }

    /// Block until one axis finishes its move.
    ///
    /// Polls at [`WaitConfig::poll_interval_ms`](crate::config::WaitConfig)
    /// and gives up after the configured timeout, if any.
    pub fn wait_until_motor_stops(&mut self, axis: u8) -> Result<()> {
        AxisId::new(axis)?;
        let mut budget = WaitBudget::new(self.wait, Some(axis));

        loop {
            if self.get_motion_complete(axis)? {
                return Ok(());
            }
            let delay = match budget.next_delay_ms() {
                Ok(delay) => delay,
                Err(e) => {
                    warn!("axis {} still moving after {} ms", axis, budget.waited_ms());
                    return Err(e.into());
                }
            };
            self.transport.delay_ms(delay);
        }
    }

    /// Block until every axis on the board is stopped.
    pub fn wait_until_all_motors_stop(&mut self) -> Result<()> {
        let mut budget = WaitBudget::new(self.wait, None);

        loop {
            if self.get_all_motors_stopped()? {
                return Ok(());
            }
            let delay = match budget.next_delay_ms() {
                Ok(delay) => delay,
                Err(e) => {
                    warn!("motors still moving after {} ms", budget.waited_ms());
                    return Err(e.into());
                }
            };
            self.transport.delay_ms(delay);
        }
    }

    // Moving axes become idle once seen stopped; homing is settled by `home`.
    pub(crate) fn settle(&mut self, axis: u8) {
        if let Ok(record) = self.axis_mut(axis) {
            if record.state == AxisState::Moving {
                record.state = AxisState::Idle;
            }
        }
    }

    // =========================================================================
    // Position and velocity readback
    // =========================================================================

    /// Read the current position in steps.
    pub fn get_current_position_in_steps(&mut self, axis: u8) -> Result<i64> {
        let id = AxisId::new(axis)?;
        let response = self.send(Opcode::GetCurrentPosition, id.value(), Payload::new())?;
        let steps = Steps(i64::from(response.reader().i32()?));
        self.axis_mut(axis)?.position = Some(steps);
        Ok(steps.value())
    }

    /// Read the current position in millimeters.
    pub fn get_current_position_in_millimeters(&mut self, axis: u8) -> Result<f32> {
        self.current_position_in(axis, Unit::Millimeters)
    }

    /// Read the current position in revolutions.
    pub fn get_current_position_in_revolutions(&mut self, axis: u8) -> Result<f32> {
        self.current_position_in(axis, Unit::Revolutions)
    }

    fn current_position_in(&mut self, axis: u8, unit: Unit) -> Result<f32> {
        // Fail before touching the bus if the factor is missing
        self.axis(axis)?.config.steps_per_unit(unit)?;
        let steps = self.get_current_position_in_steps(axis)?;
        self.steps_to(axis, Steps(steps), unit)
    }

    /// Read the current velocity in steps/sec (signed).
    pub fn get_current_velocity_in_steps_per_second(&mut self, axis: u8) -> Result<f32> {
        let id = AxisId::new(axis)?;
        let response = self.send(Opcode::GetCurrentVelocity, id.value(), Payload::new())?;
        Ok(response.reader().f32()?)
    }

    /// Read the current velocity in millimeters/sec.
    pub fn get_current_velocity_in_millimeters_per_second(&mut self, axis: u8) -> Result<f32> {
        self.current_velocity_in(axis, Unit::Millimeters)
    }

    /// Read the current velocity in revolutions/sec.
    pub fn get_current_velocity_in_revolutions_per_second(&mut self, axis: u8) -> Result<f32> {
        self.current_velocity_in(axis, Unit::Revolutions)
    }

    fn current_velocity_in(&mut self, axis: u8, unit: Unit) -> Result<f32> {
        self.axis(axis)?.config.steps_per_unit(unit)?;
        let steps_per_sec = self.get_current_velocity_in_steps_per_second(axis)?;
        Ok(self.axis(axis)?.config.steps_rate_to(steps_per_sec, unit)?)
    }
}
