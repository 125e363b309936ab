//! The sorting station control loop.
//!
//! [`SortingStation`] ties the classification gate, the position
//! controller, and the IR presence lines together into a single-threaded
//! polling state machine with two operating modes:
//!
//! - **Single-sensor**: one IR line both detects the object and marks the
//!   drop point. A trigger classifies and rotates the gate in one
//!   synchronous action.
//! - **Pipelined**: an upstream line triggers classification and the
//!   label is queued; a downstream line at the drop point pops the oldest
//!   label and rotates. The queue models the conveyor transport delay
//!   between the two sensors.
//!
//! Both modes share the same edge-triggered debounce: a high-to-low
//! transition fires once, and the trigger re-arms only after the line has
//! been seen high again, so one physical object is exactly one event.
//!
//! [`tick`](SortingStation::tick) performs one poll iteration and never
//! sleeps, which keeps the state machine drivable from a test harness
//! with synthetic line levels. [`run`](SortingStation::run) is the
//! real-hardware driver: it ticks at the configured poll interval until
//! the shutdown flag is raised, then forces the coils low.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::classify::{Classification, ClassificationGate, ClassifyError};
use crate::gate::{GateController, Rotation};
use crate::queue::{OverflowPolicy, PendingColorQueue};
use crate::traits::{CoilOutput, ColorModel, ColorSensor, Delay, Level, PresenceSensor};

/// Default pause between poll iterations in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Operating mode of the station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationMode {
    /// One sensor; classify and rotate immediately.
    Single,
    /// Two sensors; detection and action pipelined through the queue.
    Pipelined,
}

impl StationMode {
    /// Returns the mode as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StationMode::Single => "single",
            StationMode::Pipelined => "pipelined",
        }
    }
}

/// Edge-triggered debounce state for one sensor line.
///
/// Fires exactly once per high-to-low transition. Armed at construction,
/// so an object already blocking the beam at startup fires immediately;
/// nothing fires again until the line has read high.
///
/// # Example
///
/// ```rust
/// use rs_sortz::station::EdgeTrigger;
/// use rs_sortz::traits::Level;
///
/// let mut trigger = EdgeTrigger::new();
/// assert!(trigger.observe(Level::Low));   // fires
/// assert!(!trigger.observe(Level::Low));  // still blocked: no re-fire
/// assert!(!trigger.observe(Level::High)); // line clears: re-arms
/// assert!(trigger.observe(Level::Low));   // next object fires
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EdgeTrigger {
    armed: bool,
}

impl EdgeTrigger {
    /// Creates an armed trigger.
    pub fn new() -> Self {
        Self { armed: true }
    }

    /// Feeds one line level; returns true if the trigger fires.
    pub fn observe(&mut self, level: Level) -> bool {
        match level {
            Level::Low if self.armed => {
                self.armed = false;
                true
            }
            Level::Low => false,
            Level::High => {
                self.armed = true;
                false
            }
        }
    }

    /// Re-arms without waiting for the line to clear.
    ///
    /// Used after a background rejection: the "object" was the belt
    /// itself, so there is nothing to wait out.
    pub fn rearm(&mut self) {
        self.armed = true;
    }

    /// Returns true if the next low reading will fire.
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Default for EdgeTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// What one poll iteration did.
#[derive(Clone, Debug, PartialEq)]
pub enum TickEvent {
    /// No trigger fired.
    Idle,
    /// A trigger fired but the reading matched the background profile.
    BackgroundRejected,
    /// Single mode: an object was classified and the gate rotated.
    Sorted {
        /// The classified label.
        label: String,
        /// The model's confidence, unthresholded.
        confidence: f32,
        /// The rotation outcome.
        rotation: Rotation,
    },
    /// Pipelined mode: a label was queued for the drop point.
    Queued {
        /// The classified label.
        label: String,
        /// The model's confidence, unthresholded.
        confidence: f32,
        /// Queue depth after the push.
        depth: usize,
    },
    /// Pipelined mode: the queue was full and the label was dropped.
    QueueOverflow {
        /// The label that was lost.
        label: String,
    },
    /// Pipelined mode: the drop sensor fired and the gate rotated.
    Dropped {
        /// The label popped from the queue.
        label: String,
        /// The rotation outcome.
        rotation: Rotation,
    },
    /// The drop sensor fired with nothing queued.
    ///
    /// A synchronization fault: an object reached the drop point that
    /// was never detected upstream (or its label overflowed the queue).
    /// Surfaced and counted, but the loop keeps running.
    DropWithEmptyQueue,
}

/// Failure during one poll iteration.
#[derive(Debug)]
pub enum StationError<L, S, M, C> {
    /// A presence line read failed.
    Line(L),
    /// Classification failed.
    Classify(ClassifyError<S, M>),
    /// The gate motor failed.
    Motion(C),
}

/// Counters kept across the life of the station.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StationStats {
    /// Poll iterations executed.
    pub ticks: u64,
    /// Samples that reached the classifier.
    pub classified: u64,
    /// Triggers rejected as background.
    pub background_rejects: u64,
    /// Completed gate rotations (including in-position no-ops).
    pub sorted: u64,
    /// Drop-sensor triggers that found an empty queue.
    pub empty_drops: u64,
}

/// The top-level station orchestrator.
///
/// Owns every moving part of the control path. See the module docs for
/// the two operating modes and the debounce contract.
///
/// # Example
///
/// ```rust
/// use rs_sortz::classify::ClassificationGate;
/// use rs_sortz::gate::{GateController, SlotMap};
/// use rs_sortz::hal::{MockCoils, MockColorSensor, MockDelay, MockLine, MockModel};
/// use rs_sortz::sequencer::MotionSequencer;
/// use rs_sortz::station::{SortingStation, TickEvent};
/// use rs_sortz::traits::{LabelSet, Level, SensorSample};
///
/// let gate = ClassificationGate::new(
///     MockColorSensor::constant(SensorSample::rgbc(50, 200, 40, 300)),
///     MockModel::new(LabelSet::parse("R\nG\nB"), vec![0.05, 0.92, 0.03]),
/// );
/// let controller = GateController::new(
///     MotionSequencer::new(MockCoils::new(), MockDelay::new()),
///     SlotMap::default(),
/// )
/// .with_steps_per_quarter(1);
///
/// let mut line = MockLine::new();
/// line.script(&[Level::Low]);
///
/// let mut station = SortingStation::single(gate, controller, line);
/// match station.tick().unwrap() {
///     TickEvent::Sorted { label, .. } => assert_eq!(label, "G"),
///     other => panic!("unexpected event {other:?}"),
/// }
/// assert_eq!(station.controller().position().index(), 1);
/// ```
pub struct SortingStation<S, M, C, D, L>
where
    S: ColorSensor,
    M: ColorModel,
    C: CoilOutput,
    D: Delay,
    L: PresenceSensor,
{
    gate: ClassificationGate<S, M>,
    controller: GateController<C, D>,
    color_line: L,
    drop_line: Option<L>,
    queue: PendingColorQueue,
    color_trigger: EdgeTrigger,
    drop_trigger: EdgeTrigger,
    stats: StationStats,
    poll_interval_ms: u64,
}

impl<S, M, C, D, L> SortingStation<S, M, C, D, L>
where
    S: ColorSensor,
    M: ColorModel,
    C: CoilOutput,
    D: Delay,
    L: PresenceSensor,
{
    /// Creates a single-sensor station: classify and act on one line.
    pub fn single(
        gate: ClassificationGate<S, M>,
        controller: GateController<C, D>,
        line: L,
    ) -> Self {
        Self {
            gate,
            controller,
            color_line: line,
            drop_line: None,
            queue: PendingColorQueue::new(),
            color_trigger: EdgeTrigger::new(),
            drop_trigger: EdgeTrigger::new(),
            stats: StationStats::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Creates a pipelined station: upstream color line, downstream drop line.
    pub fn pipelined(
        gate: ClassificationGate<S, M>,
        controller: GateController<C, D>,
        color_line: L,
        drop_line: L,
    ) -> Self {
        Self {
            gate,
            controller,
            color_line,
            drop_line: Some(drop_line),
            queue: PendingColorQueue::new(),
            color_trigger: EdgeTrigger::new(),
            drop_trigger: EdgeTrigger::new(),
            stats: StationStats::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Sets the queue overflow policy (builder-time only).
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.queue = PendingColorQueue::new().with_policy(policy);
        self
    }

    /// Sets the pause between poll iterations used by [`run`](Self::run).
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// The station's operating mode.
    pub fn mode(&self) -> StationMode {
        if self.drop_line.is_some() {
            StationMode::Pipelined
        } else {
            StationMode::Single
        }
    }

    /// Runs one poll iteration without sleeping.
    pub fn tick(
        &mut self,
    ) -> Result<TickEvent, StationError<L::Error, S::Error, M::Error, C::Error>> {
        self.stats.ticks += 1;
        if self.drop_line.is_some() {
            self.tick_pipelined()
        } else {
            self.tick_single()
        }
    }

    fn tick_single(
        &mut self,
    ) -> Result<TickEvent, StationError<L::Error, S::Error, M::Error, C::Error>> {
        let level = self.color_line.level().map_err(StationError::Line)?;
        if !self.color_trigger.observe(level) {
            return Ok(TickEvent::Idle);
        }

        match self.gate.classify().map_err(StationError::Classify)? {
            Classification::Background => {
                self.stats.background_rejects += 1;
                self.color_trigger.rearm();
                Ok(TickEvent::BackgroundRejected)
            }
            Classification::Classified { label, confidence } => {
                self.stats.classified += 1;
                info!(label = %label, confidence, "object detected");
                let rotation = self
                    .controller
                    .rotate_to(&label)
                    .map_err(StationError::Motion)?;
                self.stats.sorted += 1;
                Ok(TickEvent::Sorted {
                    label,
                    confidence,
                    rotation,
                })
            }
        }
    }

    fn tick_pipelined(
        &mut self,
    ) -> Result<TickEvent, StationError<L::Error, S::Error, M::Error, C::Error>> {
        // Upstream line first, so a same-tick race favors enqueue over dequeue.
        let level = self.color_line.level().map_err(StationError::Line)?;
        if self.color_trigger.observe(level) {
            return match self.gate.classify().map_err(StationError::Classify)? {
                Classification::Background => {
                    self.stats.background_rejects += 1;
                    self.color_trigger.rearm();
                    Ok(TickEvent::BackgroundRejected)
                }
                Classification::Classified { label, confidence } => {
                    self.stats.classified += 1;
                    if self.queue.push(label.clone()) {
                        info!(
                            label = %label,
                            confidence,
                            depth = self.queue.len(),
                            "label queued for drop point"
                        );
                        Ok(TickEvent::Queued {
                            label,
                            confidence,
                            depth: self.queue.len(),
                        })
                    } else {
                        Ok(TickEvent::QueueOverflow { label })
                    }
                }
            };
        }

        let Some(drop_line) = self.drop_line.as_mut() else {
            return Ok(TickEvent::Idle);
        };
        let level = drop_line.level().map_err(StationError::Line)?;
        if self.drop_trigger.observe(level) {
            return match self.queue.pop() {
                Some(label) => {
                    info!(label = %label, remaining = self.queue.len(), "object at drop point");
                    let rotation = self
                        .controller
                        .rotate_to(&label)
                        .map_err(StationError::Motion)?;
                    self.stats.sorted += 1;
                    Ok(TickEvent::Dropped { label, rotation })
                }
                None => {
                    warn!("drop sensor fired with nothing queued");
                    self.stats.empty_drops += 1;
                    Ok(TickEvent::DropWithEmptyQueue)
                }
            };
        }

        Ok(TickEvent::Idle)
    }

    /// Polls until the shutdown flag is raised, then releases the coils.
    ///
    /// Tick errors are logged and the loop continues; the station favors
    /// staying up over crashing on an anomaly. Shutdown is checked
    /// between iterations, so a rotation in progress always completes
    /// (and de-energizes) before the loop exits. The coils are driven
    /// low on the way out regardless of how the last tick went.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<(), C::Error>
    where
        L::Error: core::fmt::Debug,
        S::Error: core::fmt::Debug,
        M::Error: core::fmt::Debug,
        C::Error: core::fmt::Debug,
    {
        info!(mode = self.mode().as_str(), "sorting loop started");
        while !shutdown.load(Ordering::SeqCst) {
            match self.tick() {
                Ok(TickEvent::Idle) => {}
                Ok(event) => debug!(event = ?event, "tick event"),
                Err(err) => warn!(error = ?err, "tick failed; continuing"),
            }
            thread::sleep(Duration::from_millis(self.poll_interval_ms));
        }
        info!("shutdown requested; releasing coils");
        self.controller.release()
    }

    /// The gate position controller.
    pub fn controller(&self) -> &GateController<C, D> {
        &self.controller
    }

    /// The classification gate.
    pub fn gate(&self) -> &ClassificationGate<S, M> {
        &self.gate
    }

    /// Mutable access to the classification gate, for recalibration.
    pub fn gate_mut(&mut self) -> &mut ClassificationGate<S, M> {
        &mut self.gate
    }

    /// Mutable access to the color line, for scripted tests.
    pub fn color_line_mut(&mut self) -> &mut L {
        &mut self.color_line
    }

    /// Mutable access to the drop line, if the station has one.
    pub fn drop_line_mut(&mut self) -> Option<&mut L> {
        self.drop_line.as_mut()
    }

    /// Labels currently waiting for the drop point.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Labels lost to queue overflow so far.
    pub fn queue_overflows(&self) -> u32 {
        self.queue.overflow_count()
    }

    /// Snapshot of the station counters.
    pub fn stats(&self) -> StationStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_trigger_fires_once_per_transition() {
        let mut t = EdgeTrigger::new();
        assert!(t.observe(Level::Low));
        assert!(!t.observe(Level::Low));
        assert!(!t.observe(Level::Low));
        assert!(!t.observe(Level::High));
        assert!(t.observe(Level::Low));
    }

    #[test]
    fn edge_trigger_armed_at_construction() {
        // An object already blocking the beam at startup fires immediately.
        let mut t = EdgeTrigger::new();
        assert!(t.is_armed());
        assert!(t.observe(Level::Low));
    }

    #[test]
    fn edge_trigger_high_reads_keep_it_armed() {
        let mut t = EdgeTrigger::new();
        assert!(!t.observe(Level::High));
        assert!(!t.observe(Level::High));
        assert!(t.observe(Level::Low));
    }

    #[test]
    fn edge_trigger_rearm_skips_the_clear_wait() {
        let mut t = EdgeTrigger::new();
        assert!(t.observe(Level::Low));
        t.rearm();
        assert!(t.observe(Level::Low));
    }

    #[test]
    fn station_mode_strings() {
        assert_eq!(StationMode::Single.as_str(), "single");
        assert_eq!(StationMode::Pipelined.as_str(), "pipelined");
    }
}
