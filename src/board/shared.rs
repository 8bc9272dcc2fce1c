//! Thread-safe board handle (std only).

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::Result;
use crate::motion::{HomingRequest, MotionRequest, WaitBudget};

use super::driver::StepperBoard;

/// A board handle that several threads can command.
///
/// Each call holds the lock for one command/response exchange, so commands
/// from different threads never interleave on the bus. Blocking waits release
/// the lock between polls and sleep on the calling thread, letting other
/// callers command the board while an axis moves.
pub struct SharedBoard<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    inner: Arc<Mutex<StepperBoard<BUS, DELAY>>>,
}

impl<BUS, DELAY> Clone for SharedBoard<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<BUS, DELAY> SharedBoard<BUS, DELAY>
where
    BUS: I2c,
    DELAY: DelayNs,
{
    /// Wrap a board for shared use.
    pub fn new(board: StepperBoard<BUS, DELAY>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(board)),
        }
    }

    /// Lock the board for a sequence of commands.
    ///
    /// A panic in another holder does not leave the board unusable: the
    /// board's own state is only updated after acknowledged commands.
    pub fn lock(&self) -> MutexGuard<'_, StepperBoard<BUS, DELAY>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the board.
    pub fn with<R>(&self, f: impl FnOnce(&mut StepperBoard<BUS, DELAY>) -> R) -> R {
        let mut board = self.lock();
        f(&mut *board)
    }

    /// Issue a move; if it waits, poll without holding the lock.
    pub fn execute(&self, axis: u8, request: MotionRequest) -> Result<()> {
        let start = MotionRequest {
            wait: false,
            ..request
        };
        self.with(|board| board.execute(axis, start))?;

        if request.wait {
            self.wait_until_motor_stops(axis)?;
        }
        Ok(())
    }

    /// Search for the home sensor, releasing the lock between polls.
    ///
    /// Same outcome as [`StepperBoard::home`].
    pub fn home(&self, axis: u8, request: HomingRequest) -> Result<()> {
        self.with(|board| board.begin_home(axis, request))?;
        let outcome = self.wait_until_motor_stops(axis);
        self.with(|board| board.finish_home(axis, outcome))
    }

    /// Block until one axis stops, releasing the lock between polls.
    pub fn wait_until_motor_stops(&self, axis: u8) -> Result<()> {
        let mut budget = WaitBudget::new(self.with(|board| board.wait_config()), Some(axis));

        loop {
            if self.with(|board| board.get_motion_complete(axis))? {
                return Ok(());
            }
            sleep_ms(budget.next_delay_ms()?);
        }
    }

    /// Block until every axis stops, releasing the lock between polls.
    pub fn wait_until_all_motors_stop(&self) -> Result<()> {
        let mut budget = WaitBudget::new(self.with(|board| board.wait_config()), None);

        loop {
            if self.with(|board| board.get_all_motors_stopped())? {
                return Ok(());
            }
            sleep_ms(budget.next_delay_ms()?);
        }
    }

    /// Take the board back if this is the last handle.
    pub fn into_inner(self) -> Option<StepperBoard<BUS, DELAY>> {
        Arc::try_unwrap(self.inner)
            .ok()
            .map(|mutex| mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

fn sleep_ms(ms: u32) {
    thread::sleep(Duration::from_millis(u64::from(ms)));
}
