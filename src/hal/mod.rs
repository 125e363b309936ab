//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `softmax`: Serde-loaded scaler + softmax classifier adapter
//! - `rpi`: Raspberry Pi GPIO and TCS34725 bindings (requires the `rpi` feature)

pub mod mock;
pub mod softmax;

#[cfg(feature = "rpi")]
pub mod rpi;

pub use mock::*;
pub use softmax::{SoftmaxModel, SoftmaxModelError};

#[cfg(feature = "rpi")]
pub use rpi::*;

use crate::traits::Delay;

/// Delay source backed by [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_us(&mut self, us: u64) {
        std::thread::sleep(std::time::Duration::from_micros(us));
    }
}
