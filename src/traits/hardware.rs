//! Hardware abstraction traits for coil outputs, sensor lines, and delays.
//!
//! This module defines the hardware interfaces that allow rs-sortz to
//! work across different platforms (Raspberry Pi, desktop mocks, etc.).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`CoilOutput`] | The four stepper motor coil lines |
//! | [`PresenceSensor`] | An active-low IR beam-break line |
//! | [`Delay`] | Blocking delay source for step and sample timing |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For Raspberry Pi hardware, use the
//! implementations from `hal::rpi` (requires the `rpi` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_sortz::traits::{CoilOutput, PresenceSensor, Level};
//! use rs_sortz::hal::{MockCoils, MockLine};
//!
//! let mut coils = MockCoils::new();
//! coils.set_pattern([true, false, false, false]).unwrap();
//! coils.release().unwrap();
//! assert_eq!(coils.pattern, [false; 4]);
//!
//! let mut line = MockLine::new();
//! assert_eq!(line.level().unwrap(), Level::High); // idle by default
//! ```

/// Logic level of a digital sensor line.
///
/// The IR presence sensors are active-low: the line reads [`Low`](Self::Low)
/// while the beam is broken by an object and [`High`](Self::High) when the
/// conveyor in front of the sensor is clear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Line asserted: an object is in front of the sensor.
    Low,
    /// Line idle: nothing in front of the sensor.
    High,
}

impl Level {
    /// Returns true if this level means an object is present.
    #[inline]
    pub const fn object_present(self) -> bool {
        matches!(self, Level::Low)
    }
}

/// Rotation direction of the stepper motor.
///
/// The gate only ever rotates forward during normal sorting; reverse
/// exists for bench testing and manual jogging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    /// Walk the phase table in order.
    #[default]
    Forward,
    /// Walk the phase table in reverse order.
    Reverse,
}

impl StepDirection {
    /// Returns the direction as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepDirection::Forward => "forward",
            StepDirection::Reverse => "reverse",
        }
    }
}

/// A coil pattern with every winding de-energized.
pub const COILS_OFF: [bool; 4] = [false; 4];

/// Output driver for the four stepper coil lines.
///
/// Implement this for your GPIO platform. The sequencer writes one
/// four-bit pattern per half-step phase; `true` energizes a winding.
///
/// # Implementation Notes
///
/// - All four lines must be written for every pattern, not just the
///   lines that changed.
/// - Implementations should start with all coils low and be safe to
///   [`release`](Self::release) repeatedly.
pub trait CoilOutput {
    /// Error type for pin writes.
    type Error;

    /// Drive the four coil lines to the given pattern.
    fn set_pattern(&mut self, pattern: [bool; 4]) -> Result<(), Self::Error>;

    /// Drive all four coil lines low.
    ///
    /// Called after every motion command and during teardown so the
    /// motor never holds current while idle.
    fn release(&mut self) -> Result<(), Self::Error> {
        self.set_pattern(COILS_OFF)
    }
}

/// Digital input for an IR presence line.
///
/// Returns the current [`Level`] of the line. The read takes `&mut self`
/// so mock implementations can consume a scripted sequence of levels.
pub trait PresenceSensor {
    /// Error type for line reads.
    type Error;

    /// Sample the line level.
    fn level(&mut self) -> Result<Level, Self::Error>;
}

/// Blocking delay source.
///
/// Used for the per-phase step hold and the inter-sample calibration
/// delay. Kept behind a trait so unit tests run without real sleeps.
pub trait Delay {
    /// Block for the given number of microseconds.
    fn delay_us(&mut self, us: u64);

    /// Block for the given number of milliseconds.
    fn delay_ms(&mut self, ms: u64) {
        self.delay_us(ms.saturating_mul(1000));
    }
}
