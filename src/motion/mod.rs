//! Motion module for stepper-board.
//!
//! Provides motion requests and the polling budget used by blocking waits.
//! Motion profiles themselves run in the board firmware.

mod request;
mod wait;

pub use request::{Direction, HomingRequest, MotionRequest, Target};
pub use wait::WaitBudget;
