//! Sample-to-label pipeline: background rejection, features, inference.
//!
//! [`ClassificationGate`] is the single entry point from "the sensor saw
//! something" to "this is a green piece". It reads a sample, consults the
//! background profile first (a background hit never reaches the model:
//! no wasted inference, nothing to enqueue), then derives the fixed
//! feature vector and takes the model's argmax label verbatim.
//!
//! No confidence thresholding happens here. The confidence is passed
//! through untouched for the orchestrator or operator tooling to act on.

use tracing::debug;

use crate::background::BackgroundProfile;
use crate::traits::{ColorModel, ColorSensor, FeatureVector, SensorSample};

/// Epsilon guarding the ratio features against zero denominators.
pub const FEATURE_EPS: f32 = 1e-6;

/// Derives the 8-element feature vector from a raw sample.
///
/// Layout: `[r, g, b] / (r+g+b)`, then `[r, g, b] / c`, then color
/// temperature and lux. Missing derived channels enter as `0.0`; the
/// model is trained with the same substitution.
pub fn extract_features(sample: &SensorSample) -> FeatureVector {
    let (r, g, b, c) = (
        sample.r as f32,
        sample.g as f32,
        sample.b as f32,
        sample.c as f32,
    );
    let sum_rgb = r + g + b + FEATURE_EPS;
    let clear = c + FEATURE_EPS;
    [
        r / sum_rgb,
        g / sum_rgb,
        b / sum_rgb,
        r / clear,
        g / clear,
        b / clear,
        sample.color_temp.unwrap_or(0.0),
        sample.lux.unwrap_or(0.0),
    ]
}

/// Outcome of classifying one sensor trigger.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// The reading matched the calibrated empty-belt profile.
    Background,
    /// The model labeled the reading.
    Classified {
        /// The most probable label.
        label: String,
        /// The model's probability for that label, unthresholded.
        confidence: f32,
    },
}

/// Failure while classifying a trigger.
#[derive(Debug)]
pub enum ClassifyError<S, M> {
    /// The raw sensor read failed.
    Sensor(S),
    /// Model inference failed.
    Model(M),
    /// The model returned an empty distribution.
    NoPrediction,
}

/// Classifier front-end with background rejection.
///
/// Owns the color sensor, the model, and an optional background profile.
/// With no profile (none computed or loaded yet), nothing is treated as
/// background; the gate fails open toward classification rather than
/// silently dropping real objects.
///
/// # Example
///
/// ```rust
/// use rs_sortz::classify::{Classification, ClassificationGate};
/// use rs_sortz::hal::{MockColorSensor, MockModel};
/// use rs_sortz::traits::{LabelSet, SensorSample};
///
/// let sensor = MockColorSensor::constant(SensorSample::rgbc(50, 200, 40, 300));
/// let model = MockModel::new(LabelSet::parse("R\nG\nB"), vec![0.05, 0.92, 0.03]);
/// let mut gate = ClassificationGate::new(sensor, model);
///
/// let result = gate.classify().unwrap();
/// assert_eq!(
///     result,
///     Classification::Classified { label: "G".into(), confidence: 0.92 }
/// );
/// ```
pub struct ClassificationGate<S: ColorSensor, M: ColorModel> {
    sensor: S,
    model: M,
    profile: Option<BackgroundProfile>,
}

impl<S: ColorSensor, M: ColorModel> ClassificationGate<S, M> {
    /// Creates a gate with no background profile.
    pub fn new(sensor: S, model: M) -> Self {
        Self {
            sensor,
            model,
            profile: None,
        }
    }

    /// Sets the background profile.
    pub fn with_profile(mut self, profile: Option<BackgroundProfile>) -> Self {
        self.profile = profile;
        self
    }

    /// Replaces the background profile after a recalibration.
    pub fn set_profile(&mut self, profile: BackgroundProfile) {
        self.profile = Some(profile);
    }

    /// The active background profile, if any.
    pub fn profile(&self) -> Option<&BackgroundProfile> {
        self.profile.as_ref()
    }

    /// Reads one sample and classifies it.
    pub fn classify(&mut self) -> Result<Classification, ClassifyError<S::Error, M::Error>> {
        let sample = self.sensor.read().map_err(ClassifyError::Sensor)?;

        if self
            .profile
            .as_ref()
            .is_some_and(|p| p.is_background(&sample))
        {
            debug!(
                r = sample.r,
                g = sample.g,
                b = sample.b,
                c = sample.c,
                "reading matches background profile"
            );
            return Ok(Classification::Background);
        }

        let features = extract_features(&sample);
        let distribution = self.model.infer(&features).map_err(ClassifyError::Model)?;
        let (label, confidence) = self
            .model
            .labels()
            .argmax(&distribution)
            .ok_or(ClassifyError::NoPrediction)?;

        debug!(
            r = sample.r,
            g = sample.g,
            b = sample.b,
            c = sample.c,
            label,
            confidence,
            "sample classified"
        );
        Ok(Classification::Classified {
            label: label.to_string(),
            confidence,
        })
    }

    /// Mutable access to the sensor, for calibration runs.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Mutable access to the model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }
}
