//! Empty-conveyor fingerprinting and rejection.
//!
//! Before anything is classified, a reading has to be distinguished from
//! the conveyor belt itself, since the IR beam also breaks on belt seams and
//! reflections. [`BackgroundProfile`] holds per-channel statistics of the
//! empty belt, built by [`calibrate_background`] and persisted as JSON so
//! a station restart does not require an empty-belt pass every time.
//!
//! The rejection rule is conjunctive: a sample counts as background only
//! when **all four** channels sit within `std_dev * threshold_multiplier`
//! of the calibrated mean. One channel out of range means "object".

use std::fs;
use std::path::Path;

use tracing::info;

use crate::traits::{ColorSensor, Delay, SensorSample};

/// Default number of empty-belt samples taken during calibration.
pub const DEFAULT_SAMPLE_COUNT: usize = 20;

/// Default pause between calibration samples in milliseconds.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;

/// Default tolerance multiplier applied to each channel's std deviation.
pub const DEFAULT_THRESHOLD_MULTIPLIER: f32 = 3.0;

/// Statistical fingerprint of the empty conveyor.
///
/// Immutable once in use; a new profile is produced only by re-running
/// calibration. Serializes to JSON and round-trips exactly.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundProfile {
    /// Per-channel mean, in RGBC order.
    pub mean: [f32; 4],
    /// Per-channel population standard deviation, in RGBC order.
    pub std_dev: [f32; 4],
    /// Tolerance multiplier applied to each channel's deviation.
    pub threshold_multiplier: f32,
}

impl BackgroundProfile {
    /// Returns true if the sample is indistinguishable from the empty belt.
    ///
    /// True only when every channel satisfies
    /// `|channel - mean| <= std_dev * threshold_multiplier`.
    pub fn is_background(&self, sample: &SensorSample) -> bool {
        let channels = [sample.r, sample.g, sample.b, sample.c];
        channels
            .iter()
            .zip(self.mean.iter().zip(self.std_dev.iter()))
            .all(|(&value, (&mean, &std_dev))| {
                (value as f32 - mean).abs() <= std_dev * self.threshold_multiplier
            })
    }

    /// Loads a profile from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileStoreError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Writes the profile to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProfileStoreError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// Failure while loading or saving a profile.
///
/// Never fatal to the station: a load failure falls back to fresh
/// calibration, and a save failure only costs the next startup a
/// recalibration.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    /// The file could not be read or written.
    #[error("profile file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents were not a valid profile.
    #[error("profile file malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Samples the empty belt and computes a background profile.
///
/// Takes `count` readings with `interval_ms` between them, then computes
/// per-channel mean and population standard deviation. The belt must be
/// empty while this runs; the caller is responsible for prompting the
/// operator. A `count` of zero is clamped to one sample.
pub fn calibrate_background<S: ColorSensor, D: Delay>(
    sensor: &mut S,
    delay: &mut D,
    count: usize,
    interval_ms: u64,
    threshold_multiplier: f32,
) -> Result<BackgroundProfile, S::Error> {
    let count = count.max(1);
    info!(samples = count, "calibrating conveyor background");

    let mut readings: Vec<[f32; 4]> = Vec::with_capacity(count);
    for i in 0..count {
        let sample = sensor.read()?;
        readings.push([
            sample.r as f32,
            sample.g as f32,
            sample.b as f32,
            sample.c as f32,
        ]);
        if (i + 1) % 5 == 0 {
            info!(taken = i + 1, total = count, "background sampling progress");
        }
        delay.delay_ms(interval_ms);
    }

    let n = readings.len() as f32;
    let mut mean = [0.0f32; 4];
    for reading in &readings {
        for (m, v) in mean.iter_mut().zip(reading.iter()) {
            *m += v;
        }
    }
    for m in &mut mean {
        *m /= n;
    }

    let mut std_dev = [0.0f32; 4];
    for reading in &readings {
        for ((s, v), m) in std_dev.iter_mut().zip(reading.iter()).zip(mean.iter()) {
            let d = v - m;
            *s += d * d;
        }
    }
    for s in &mut std_dev {
        *s = (*s / n).sqrt();
    }

    let profile = BackgroundProfile {
        mean,
        std_dev,
        threshold_multiplier,
    };
    info!(
        r_mean = profile.mean[0],
        g_mean = profile.mean[1],
        b_mean = profile.mean[2],
        c_mean = profile.mean[3],
        "background calibration complete"
    );
    Ok(profile)
}
