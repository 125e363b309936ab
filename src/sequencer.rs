//! Half-step coil sequencing for the 28BYJ-48 class gate motor.
//!
//! [`MotionSequencer`] is the only place in the crate that writes coil
//! pins. It walks the fixed 8-phase half-step table once per step,
//! holding each phase for the configured delay, and always leaves the
//! motor de-energized when it returns: on success, on a pin-write
//! failure mid-walk, and on the zero-step no-op alike.
//!
//! Motion commands are blocking and must not be re-entered: a command
//! fully completes, including the trailing de-energize, before the next
//! one starts. The single-threaded control loop guarantees this by
//! construction.

use tracing::trace;

use crate::traits::{CoilOutput, Delay, StepDirection};

/// One electrical cycle of the motor in half-step drive.
///
/// Alternates single- and double-coil phases; walking the table once is
/// eight phase writes. Reversing the walk order reverses the rotation.
pub const HALF_STEP_SEQUENCE: [[bool; 4]; 8] = [
    [true, false, false, false],
    [true, true, false, false],
    [false, true, false, false],
    [false, true, true, false],
    [false, false, true, false],
    [false, false, true, true],
    [false, false, false, true],
    [true, false, false, true],
];

/// Default hold per phase in microseconds (1 ms).
pub const DEFAULT_STEP_DELAY_US: u64 = 1_000;

/// Timed walker over the half-step phase table.
///
/// Owns the coil driver and the delay source. See the module docs for
/// the de-energize guarantee.
///
/// # Example
///
/// ```rust
/// use rs_sortz::hal::{MockCoils, MockDelay};
/// use rs_sortz::sequencer::MotionSequencer;
/// use rs_sortz::traits::StepDirection;
///
/// let mut seq = MotionSequencer::new(MockCoils::new(), MockDelay::new());
/// seq.advance(2, StepDirection::Forward).unwrap();
///
/// // 2 steps x 8 phases, plus the trailing all-low write
/// assert_eq!(seq.coils().writes.len(), 17);
/// assert_eq!(seq.coils().pattern, [false; 4]);
/// ```
pub struct MotionSequencer<C: CoilOutput, D: Delay> {
    coils: C,
    delay: D,
    step_delay_us: u64,
}

impl<C: CoilOutput, D: Delay> MotionSequencer<C, D> {
    /// Creates a sequencer with the default per-phase hold.
    pub fn new(coils: C, delay: D) -> Self {
        Self {
            coils,
            delay,
            step_delay_us: DEFAULT_STEP_DELAY_US,
        }
    }

    /// Sets the per-phase hold in microseconds.
    pub fn with_step_delay_us(mut self, us: u64) -> Self {
        self.step_delay_us = us;
        self
    }

    /// Walks the phase table `steps` times in the given direction.
    ///
    /// Blocks for `steps * 8 * step_delay`. The coils are driven low
    /// before this returns, whether the walk completed or a pin write
    /// failed partway through; a partial walk leaves the rotor wherever
    /// it stopped, which is why callers must not assume position change
    /// on error.
    pub fn advance(&mut self, steps: u32, direction: StepDirection) -> Result<(), C::Error> {
        trace!(steps, direction = direction.as_str(), "advancing motor");
        let walked = self.walk(steps, direction);
        let released = self.coils.release();
        walked.and(released)
    }

    fn walk(&mut self, steps: u32, direction: StepDirection) -> Result<(), C::Error> {
        for _ in 0..steps {
            match direction {
                StepDirection::Forward => {
                    for pattern in HALF_STEP_SEQUENCE {
                        self.coils.set_pattern(pattern)?;
                        self.delay.delay_us(self.step_delay_us);
                    }
                }
                StepDirection::Reverse => {
                    for pattern in HALF_STEP_SEQUENCE.iter().rev() {
                        self.coils.set_pattern(*pattern)?;
                        self.delay.delay_us(self.step_delay_us);
                    }
                }
            }
        }
        Ok(())
    }

    /// Drives all coils low without moving.
    pub fn release(&mut self) -> Result<(), C::Error> {
        self.coils.release()
    }

    /// Blocks for the given number of milliseconds on the owned delay.
    ///
    /// Used for mechanical settle pauses between calibration turns.
    pub fn dwell_ms(&mut self, ms: u64) {
        self.delay.delay_ms(ms);
    }

    /// The coil driver.
    pub fn coils(&self) -> &C {
        &self.coils
    }

    /// Mutable access to the coil driver.
    pub fn coils_mut(&mut self) -> &mut C {
        &mut self.coils
    }
}
