//! Board module for stepper-board.
//!
//! Provides the board driver, its builder and the per-axis state it tracks.

mod builder;
mod driver;
mod motion;
mod state;
mod status;
mod system;
#[cfg(feature = "std")]
mod shared;

pub use builder::StepperBoardBuilder;
pub use driver::StepperBoard;
pub use state::AxisState;
pub use status::StepperStatus;
pub use system::BoardSystem;
#[cfg(feature = "std")]
pub use shared::SharedBoard;
