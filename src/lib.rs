//! # stepper-board
//!
//! Host-side driver for multi-axis stepper controller boards on an I2C bus,
//! with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Up to four boards per bus**: each board is jumper-addressed 0-3 and
//!   drives three axes
//! - **Reliable transport**: CRC-checked, sequence-numbered frames with
//!   bounded retries and a per-board error counter
//! - **Units**: positions, speeds and accelerations in steps, millimeters or
//!   revolutions
//! - **Blocking or non-blocking moves**: poll-until-stopped with a configurable
//!   interval and optional timeout
//! - **Configuration-driven**: describe boards and axes in TOML files
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_board::StepperBoard;
//!
//! let mut board = StepperBoard::builder()
//!     .bus(i2c)
//!     .delay(delay)
//!     .address(0)
//!     .build()?;
//!
//! board.initialize()?;
//! board.set_microstepping(8)?;
//! board.set_steps_per_millimeter(0, 64.0)?;
//! board.enable_motors(true)?;
//!
//! board.move_to_home_in_millimeters(0, -1, 10.0, 300.0)?;
//! board.move_to_absolute_position_in_millimeters(0, 120.0, true)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables TOML file loading and [`SharedBoard`]
//! - `defmt`: Enables defmt logging for embedded targets
//! - `log`: Enables logging through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

// Core modules
pub mod board;
pub mod config;
pub mod error;
pub mod motion;
pub mod protocol;
pub mod transport;

// Re-exports for ergonomic API
pub use board::{AxisState, BoardSystem, StepperBoard, StepperBoardBuilder, StepperStatus};
pub use config::{validate_config, AxisConfig, BoardAddress, SystemConfig, TransportConfig, WaitConfig};
pub use error::{Error, Result};
pub use motion::{Direction, HomingRequest, MotionRequest, Target};
pub use transport::Transport;

#[cfg(feature = "std")]
pub use board::SharedBoard;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Distance, Microsteps, Millimeters, Rate, Revolutions, Steps, Unit, UnitExt};
