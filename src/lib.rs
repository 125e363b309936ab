//! # rs-sortz
//!
//! A conveyor color-sorting station controller: IR presence sensors
//! trigger a color read, a classifier labels the object, and a
//! stepper-driven gate rotates to the matching bin.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for coil outputs, IR lines, the
//!   color sensor, and the classifier, with mock implementations
//! - **Background rejection**: A calibrated statistical profile of the
//!   empty belt filters out non-object triggers before inference
//! - **Two operating modes**: Immediate single-sensor sorting, or a
//!   two-sensor pipeline with a bounded FIFO bridging the transport delay
//! - **Bounded motion**: The gate only ever turns forward, at most three
//!   quarter-turns per command, and always de-energizes afterwards
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and classifier abstractions
//! - `sequencer` - Half-step coil sequencing
//! - `gate` - Slot arithmetic and gate rotation
//! - `background` - Empty-belt calibration and rejection
//! - `classify` - Feature extraction and the classification gate
//! - `queue` - Bounded FIFO of pending labels
//! - `station` - The polling control loop for both modes
//! - `config` - Builder-style station configuration
//! - `hal` - Concrete implementations (mock for testing, rpi for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_sortz::{
//!     ClassificationGate, GateController, MotionSequencer, SlotMap, SortingStation, TickEvent,
//!     hal::{MockCoils, MockColorSensor, MockDelay, MockLine, MockModel},
//!     traits::{LabelSet, Level, SensorSample},
//! };
//!
//! // A station with mock hardware: one IR line, a stubbed classifier.
//! let gate = ClassificationGate::new(
//!     MockColorSensor::constant(SensorSample::rgbc(50, 200, 40, 300)),
//!     MockModel::new(LabelSet::parse("R\nG\nB"), vec![0.05, 0.92, 0.03]),
//! );
//! let controller = GateController::new(
//!     MotionSequencer::new(MockCoils::new(), MockDelay::new()),
//!     SlotMap::default(),
//! );
//!
//! let mut line = MockLine::new();
//! line.script(&[Level::Low]); // an object breaks the beam
//!
//! let mut station = SortingStation::single(gate, controller, line);
//!
//! // One poll iteration: classify "G" and rotate home -> slot 1.
//! let event = station.tick().unwrap();
//! assert!(matches!(event, TickEvent::Sorted { .. }));
//! assert_eq!(station.controller().position().index(), 1);
//! ```

#![warn(missing_docs)]

/// Empty-belt calibration, the background profile, and its persistence.
pub mod background;
/// Feature extraction and the background-rejecting classification gate.
pub mod classify;
/// Builder-style station configuration.
pub mod config;
/// Slot arithmetic, the label-to-slot table, and gate rotation.
pub mod gate;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Bounded FIFO of labels awaiting the drop point.
pub mod queue;
/// Half-step coil sequencing for the gate motor.
pub mod sequencer;
/// The polling control loop for both operating modes.
pub mod station;
/// Core traits for hardware and classifier abstraction.
pub mod traits;

// Re-exports for convenience
pub use background::{calibrate_background, BackgroundProfile, ProfileStoreError};
pub use classify::{extract_features, Classification, ClassificationGate, ClassifyError};
pub use config::{
    CalibrationConfig, LoopConfig, ModelConfig, MotorConfig, PinConfig, StationConfig,
};
pub use gate::{GateController, Rotation, Slot, SlotMap, SLOT_COUNT};
pub use queue::{OverflowPolicy, PendingColorQueue, DEFAULT_QUEUE_CAPACITY};
pub use sequencer::{MotionSequencer, HALF_STEP_SEQUENCE};
pub use station::{
    EdgeTrigger, SortingStation, StationError, StationMode, StationStats, TickEvent,
};
pub use traits::{
    // Hardware
    CoilOutput,
    ColorModel,
    ColorSensor,
    Delay,
    FeatureVector,
    LabelSet,
    Level,
    PresenceSensor,
    SensorSample,
    StepDirection,
    COILS_OFF,
};
