//! Gate position control: slots, the label-to-slot table, and rotation.
//!
//! The sorting gate has four discrete quarter-turn positions. This module
//! keeps the controller's view of the current slot, converts a color label
//! into the minimal forward rotation, and delegates the actual stepping to
//! [`MotionSequencer`].
//!
//! Two invariants live here:
//!
//! - The gate only rotates forward. `(target - current) mod 4` forward
//!   quarter-turns are issued even when a reverse turn would be shorter.
//! - The stored position is updated only after a rotation completes, so a
//!   failed pin write mid-rotation leaves the stored position at the last
//!   known-good slot.

use tracing::{debug, info};

use crate::sequencer::MotionSequencer;
use crate::traits::{CoilOutput, Delay, StepDirection};

/// Number of discrete gate positions.
pub const SLOT_COUNT: u8 = 4;

/// Default full steps per quarter-turn of the gate.
pub const DEFAULT_STEPS_PER_QUARTER: u32 = 128;

/// Default settle pause between calibration turns in milliseconds.
pub const DEFAULT_CALIBRATION_DWELL_MS: u64 = 500;

/// One of the four quarter-turn positions of the gate.
///
/// Slot 0 is the calibrated home position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Slot(u8);

impl Slot {
    /// The calibrated home position.
    pub const HOME: Slot = Slot(0);

    /// Creates a slot, rejecting indices outside `0..4`.
    pub const fn new(index: u8) -> Option<Slot> {
        if index < SLOT_COUNT {
            Some(Slot(index))
        } else {
            None
        }
    }

    /// The slot index, `0..4`.
    pub const fn index(self) -> u8 {
        self.0
    }

    /// The slot's angle from home in degrees.
    pub const fn degrees(self) -> u16 {
        self.0 as u16 * 90
    }

    /// Forward quarter-turns needed to reach `target` from this slot.
    pub const fn distance_forward(self, target: Slot) -> u8 {
        (target.0 + SLOT_COUNT - self.0) % SLOT_COUNT
    }
}

/// Table mapping color labels to gate slots.
///
/// Every label the classifier can emit should be present; anything
/// unmapped resolves to the reject slot, which also catches the
/// classifier's explicit unknown label.
///
/// # Example
///
/// ```rust
/// use rs_sortz::gate::{Slot, SlotMap};
///
/// let map = SlotMap::default();
/// assert_eq!(map.resolve("G"), Slot::new(1).unwrap());
/// assert_eq!(map.resolve("mystery"), map.reject_slot());
/// ```
#[derive(Clone, Debug)]
pub struct SlotMap {
    targets: Vec<(String, Slot)>,
    reject: Slot,
}

impl SlotMap {
    /// Creates an empty map with the given reject slot.
    pub fn new(reject: Slot) -> Self {
        Self {
            targets: Vec::new(),
            reject,
        }
    }

    /// Adds or replaces a label's target slot.
    pub fn with_target(mut self, label: &str, slot: Slot) -> Self {
        if let Some(entry) = self.targets.iter_mut().find(|(l, _)| l == label) {
            entry.1 = slot;
        } else {
            self.targets.push((label.to_string(), slot));
        }
        self
    }

    /// Resolves a label to its slot, falling back to the reject slot.
    pub fn resolve(&self, label: &str) -> Slot {
        self.targets
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, slot)| *slot)
            .unwrap_or(self.reject)
    }

    /// The slot unmapped labels fall back to.
    pub fn reject_slot(&self) -> Slot {
        self.reject
    }
}

impl Default for SlotMap {
    /// R, G, and B bins on slots 0..3, everything else to slot 3.
    fn default() -> Self {
        SlotMap::new(Slot(3))
            .with_target("R", Slot(0))
            .with_target("G", Slot(1))
            .with_target("B", Slot(2))
    }
}

/// Outcome of a rotation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    /// The gate was already at the target slot; no motion occurred.
    AlreadyInPosition(Slot),
    /// The gate turned forward to the target slot.
    Turned {
        /// Forward quarter-turns issued.
        quarter_turns: u8,
        /// The slot the gate is now at.
        to: Slot,
    },
}

impl Rotation {
    /// The slot the gate occupies after this outcome.
    pub fn position(self) -> Slot {
        match self {
            Rotation::AlreadyInPosition(slot) => slot,
            Rotation::Turned { to, .. } => to,
        }
    }
}

/// Position controller for the sorting gate.
///
/// Tracks the current slot and issues bounded forward rotations through
/// the owned [`MotionSequencer`]. Single-threaded by design: position is
/// never read while a rotation is in progress.
///
/// # Example
///
/// ```rust
/// use rs_sortz::gate::{GateController, Rotation, Slot, SlotMap};
/// use rs_sortz::hal::{MockCoils, MockDelay};
/// use rs_sortz::sequencer::MotionSequencer;
///
/// let seq = MotionSequencer::new(MockCoils::new(), MockDelay::new());
/// let mut gate = GateController::new(seq, SlotMap::default()).with_steps_per_quarter(1);
///
/// let outcome = gate.rotate_to("B").unwrap();
/// assert_eq!(
///     outcome,
///     Rotation::Turned { quarter_turns: 2, to: Slot::new(2).unwrap() }
/// );
/// assert_eq!(gate.position().index(), 2);
/// ```
pub struct GateController<C: CoilOutput, D: Delay> {
    sequencer: MotionSequencer<C, D>,
    slots: SlotMap,
    position: Slot,
    steps_per_quarter: u32,
    calibration_dwell_ms: u64,
}

impl<C: CoilOutput, D: Delay> GateController<C, D> {
    /// Creates a controller assumed to start at the home slot.
    ///
    /// Run [`calibrate`](Self::calibrate) before sorting if the physical
    /// gate position is unknown.
    pub fn new(sequencer: MotionSequencer<C, D>, slots: SlotMap) -> Self {
        Self {
            sequencer,
            slots,
            position: Slot::HOME,
            steps_per_quarter: DEFAULT_STEPS_PER_QUARTER,
            calibration_dwell_ms: DEFAULT_CALIBRATION_DWELL_MS,
        }
    }

    /// Sets the number of motor steps per quarter-turn.
    pub fn with_steps_per_quarter(mut self, steps: u32) -> Self {
        self.steps_per_quarter = steps;
        self
    }

    /// Sets the settle pause between calibration turns.
    pub fn with_calibration_dwell_ms(mut self, ms: u64) -> Self {
        self.calibration_dwell_ms = ms;
        self
    }

    /// Rotates the gate to the slot mapped to `label`.
    ///
    /// Issues exactly `(target - current) mod 4` forward quarter-turns;
    /// a difference of zero is a valid no-op, not an error. The stored
    /// position moves to the target only after the motion completes.
    pub fn rotate_to(&mut self, label: &str) -> Result<Rotation, C::Error> {
        let target = self.slots.resolve(label);
        let diff = self.position.distance_forward(target);

        if diff == 0 {
            debug!(label, slot = self.position.index(), "gate already in position");
            return Ok(Rotation::AlreadyInPosition(target));
        }

        info!(
            label,
            from = self.position.degrees(),
            to = target.degrees(),
            quarter_turns = diff,
            "rotating gate"
        );
        self.sequencer
            .advance(diff as u32 * self.steps_per_quarter, StepDirection::Forward)?;
        self.position = target;

        Ok(Rotation::Turned {
            quarter_turns: diff,
            to: target,
        })
    }

    /// Runs one full forward revolution and re-homes the position.
    ///
    /// Always 4 quarter-turns, regardless of the stored position: the
    /// point is to exercise the full mechanical range and then declare
    /// wherever the gate ended up as slot 0. This is the only operation
    /// that forcibly realigns the stored position with physical reality.
    pub fn calibrate(&mut self) -> Result<(), C::Error> {
        info!("calibrating gate range");
        for turn in 0..SLOT_COUNT {
            debug!(turn = turn + 1, total = SLOT_COUNT, "calibration quarter-turn");
            self.sequencer
                .advance(self.steps_per_quarter, StepDirection::Forward)?;
            self.sequencer.dwell_ms(self.calibration_dwell_ms);
        }
        self.position = Slot::HOME;
        info!("gate calibrated to home");
        Ok(())
    }

    /// The slot the controller believes the gate is at.
    pub fn position(&self) -> Slot {
        self.position
    }

    /// The label-to-slot table.
    pub fn slots(&self) -> &SlotMap {
        &self.slots
    }

    /// Drives all coil lines low.
    pub fn release(&mut self) -> Result<(), C::Error> {
        self.sequencer.release()
    }

    /// The owned sequencer, for inspection in tests.
    pub fn sequencer(&self) -> &MotionSequencer<C, D> {
        &self.sequencer
    }

    #[cfg(test)]
    pub(crate) fn force_position(&mut self, slot: Slot) {
        self.position = slot;
    }
}
