//! Trait definitions for hardware abstraction and the classifier boundary.
//!
//! This module defines the core abstractions that allow rs-sortz to:
//! - Run on different hardware (Raspberry Pi, desktop mock)
//! - Swap the classification engine without touching the control loop
//!
//! # Submodules
//!
//! - `hardware`: Coil outputs, presence sensor lines, delay source
//! - `sensor`: Raw color sensor readings
//! - `model`: Label set and classifier inference
//!
//! # Hardware Abstraction
//!
//! The key traits are:
//!
//! - [`CoilOutput`]: the four stepper coil lines
//! - [`PresenceSensor`]: an IR beam-break line
//! - [`ColorSensor`]: raw RGBC readings with optional derived channels
//! - [`ColorModel`]: feature vector in, probability distribution out
//! - [`Delay`]: blocking delay source, mockable for tests

pub mod hardware;
pub mod model;
pub mod sensor;

pub use hardware::*;
pub use model::*;
pub use sensor::*;
