//! Configuration module for stepper-board.
//!
//! Provides the host-side axis configuration store, unit conversions and
//! types for loading board descriptions from TOML files (with `std` feature)
//! or pre-parsed data.

pub mod axis;
pub mod board;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use axis::{AxisConfig, AxisId, AxisSettings, AXES_PER_BOARD};
pub use board::{BoardAddress, BoardConfig, TransportConfig, WaitConfig};
pub use system::{SystemConfig, MAX_BOARDS};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Distance, Microsteps, Millimeters, Rate, Revolutions, Steps, Unit, UnitExt};
