//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and classifier
//! traits, enabling development and testing on desktop without a
//! physical station.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockCoils`] | [`CoilOutput`] | Records every coil pattern written |
//! | [`MockLine`] | [`PresenceSensor`] | Scripted sequence of line levels |
//! | [`MockColorSensor`] | [`ColorSensor`] | Scripted or constant samples |
//! | [`MockModel`] | [`ColorModel`] | Fixed probability distribution |
//! | [`MockDelay`] | [`Delay`] | Accumulates requested sleep time |
//!
//! # Example
//!
//! ```rust
//! use rs_sortz::hal::{MockCoils, MockLine};
//! use rs_sortz::traits::{CoilOutput, Level, PresenceSensor};
//!
//! let mut coils = MockCoils::new();
//! coils.set_pattern([true, false, false, true]).unwrap();
//! assert_eq!(coils.writes.len(), 1);
//!
//! let mut line = MockLine::new();
//! line.script(&[Level::Low, Level::High]);
//! assert_eq!(line.level().unwrap(), Level::Low);
//! assert_eq!(line.level().unwrap(), Level::High);
//! assert_eq!(line.level().unwrap(), Level::High); // resting level once drained
//! ```

use std::collections::VecDeque;

use crate::traits::{
    CoilOutput, ColorModel, ColorSensor, Delay, FeatureVector, LabelSet, Level, PresenceSensor,
    SensorSample,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock coil driver for testing.
///
/// Records every pattern written so tests can verify phase order and the
/// trailing de-energize. Can be configured to fail after a number of
/// writes to exercise error paths.
///
/// # Example
///
/// ```rust
/// use rs_sortz::hal::MockCoils;
/// use rs_sortz::traits::CoilOutput;
///
/// let mut coils = MockCoils::new();
/// coils.set_pattern([true, true, false, false]).unwrap();
/// coils.release().unwrap();
///
/// assert_eq!(coils.writes.len(), 2);
/// assert_eq!(coils.pattern, [false; 4]);
/// ```
#[derive(Debug, Default)]
pub struct MockCoils {
    /// Every pattern written, in order.
    pub writes: Vec<[bool; 4]>,
    /// The most recently written pattern.
    pub pattern: [bool; 4],
    /// If set, writes fail once this many have succeeded.
    pub fail_after: Option<usize>,
}

impl MockCoils {
    /// Creates a mock coil driver with no writes recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes fail after `n` successful writes.
    ///
    /// The failing write itself is not recorded; release attempts after
    /// the failure still go through, mirroring a transient bus error.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl CoilOutput for MockCoils {
    type Error = ();

    fn set_pattern(&mut self, pattern: [bool; 4]) -> Result<(), ()> {
        if let Some(n) = self.fail_after {
            if self.writes.len() >= n {
                // One-shot failure; subsequent writes succeed again.
                self.fail_after = None;
                return Err(());
            }
        }
        self.writes.push(pattern);
        self.pattern = pattern;
        Ok(())
    }
}

/// Mock presence line for testing.
///
/// Returns scripted levels in order, then the resting level once the
/// script is drained. The default resting level is [`Level::High`]
/// (nothing in front of the sensor).
#[derive(Debug)]
pub struct MockLine {
    levels: VecDeque<Level>,
    resting: Level,
    /// Number of reads performed.
    pub reads: usize,
}

impl MockLine {
    /// Creates an idle line with an empty script.
    pub fn new() -> Self {
        Self {
            levels: VecDeque::new(),
            resting: Level::High,
            reads: 0,
        }
    }

    /// Appends levels to the script.
    pub fn script(&mut self, levels: &[Level]) {
        self.levels.extend(levels.iter().copied());
    }

    /// Sets the level returned once the script is drained.
    pub fn set_resting(&mut self, level: Level) {
        self.resting = level;
    }
}

impl Default for MockLine {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceSensor for MockLine {
    type Error = ();

    fn level(&mut self) -> Result<Level, ()> {
        self.reads += 1;
        Ok(self.levels.pop_front().unwrap_or(self.resting))
    }
}

/// Mock color sensor for testing.
///
/// Returns scripted samples in order, then a constant fallback sample.
///
/// # Example
///
/// ```rust
/// use rs_sortz::hal::MockColorSensor;
/// use rs_sortz::traits::{ColorSensor, SensorSample};
///
/// let mut sensor = MockColorSensor::constant(SensorSample::rgbc(10, 20, 30, 60));
/// assert_eq!(sensor.read().unwrap().g, 20);
/// assert_eq!(sensor.read_count, 1);
/// ```
#[derive(Debug)]
pub struct MockColorSensor {
    scripted: VecDeque<SensorSample>,
    fallback: SensorSample,
    /// Number of reads performed.
    pub read_count: usize,
}

impl MockColorSensor {
    /// Creates a sensor that always returns `sample`.
    pub fn constant(sample: SensorSample) -> Self {
        Self {
            scripted: VecDeque::new(),
            fallback: sample,
            read_count: 0,
        }
    }

    /// Queues samples to be returned before the constant fallback.
    pub fn script(&mut self, samples: Vec<SensorSample>) {
        self.scripted.extend(samples);
    }
}

impl ColorSensor for MockColorSensor {
    type Error = ();

    fn read(&mut self) -> Result<SensorSample, ()> {
        self.read_count += 1;
        Ok(self.scripted.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Mock classifier for testing.
///
/// Returns a fixed distribution and records the feature vectors it was
/// given.
///
/// # Example
///
/// ```rust
/// use rs_sortz::hal::MockModel;
/// use rs_sortz::traits::{ColorModel, LabelSet};
///
/// let mut model = MockModel::new(LabelSet::parse("R\nG\nB"), vec![0.1, 0.8, 0.1]);
/// let dist = model.infer(&[0.0; 8]).unwrap();
/// assert_eq!(dist, vec![0.1, 0.8, 0.1]);
/// assert_eq!(model.calls, 1);
/// ```
#[derive(Debug)]
pub struct MockModel {
    labels: LabelSet,
    response: Vec<f32>,
    /// Number of inference calls.
    pub calls: usize,
    /// The last feature vector passed to `infer`.
    pub last_features: Option<FeatureVector>,
}

impl MockModel {
    /// Creates a model returning `response` for every inference.
    pub fn new(labels: LabelSet, response: Vec<f32>) -> Self {
        Self {
            labels,
            response,
            calls: 0,
            last_features: None,
        }
    }

    /// Replaces the fixed response.
    pub fn set_response(&mut self, response: Vec<f32>) {
        self.response = response;
    }
}

impl ColorModel for MockModel {
    type Error = ();

    fn infer(&mut self, features: &FeatureVector) -> Result<Vec<f32>, ()> {
        self.calls += 1;
        self.last_features = Some(*features);
        Ok(self.response.clone())
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// Mock delay for testing.
///
/// Never sleeps; accumulates the requested time instead.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total requested delay in microseconds.
    pub total_us: u64,
    /// Number of delay calls.
    pub calls: usize,
}

impl MockDelay {
    /// Creates a delay source with nothing accumulated.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Delay for MockDelay {
    fn delay_us(&mut self, us: u64) {
        self.total_us += us;
        self.calls += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================
