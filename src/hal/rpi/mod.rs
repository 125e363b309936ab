//! Raspberry Pi hardware bindings.
//!
//! Implements the hardware traits over `rppal`:
//!
//! - [`RpiCoils`]: four GPIO output pins driving the stepper board
//! - [`RpiLine`]: a GPIO input pin for an IR presence sensor
//! - [`RpiColorSensor`]: a TCS34725 color sensor on the I²C bus
//!
//! All of this requires the `rpi` feature and only builds on Linux.

pub mod gpio;
pub mod tcs;

pub use gpio::{RpiCoils, RpiLine};
pub use tcs::RpiColorSensor;
