//! Serde-loaded classifier adapter: standard scaler + dense softmax layer.
//!
//! The trained classification engine lives outside this crate; what ships
//! here is the thin deployment adapter that loads the exported scaler
//! statistics and the final dense layer from JSON and serves the
//! [`ColorModel`] contract. Any other engine with the same
//! features-in/distribution-out contract can replace it behind the trait.

use std::convert::Infallible;
use std::fs;
use std::path::Path;

use crate::traits::{ColorModel, FeatureVector, LabelSet, FEATURE_COUNT};

/// On-disk format of the exported model.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SoftmaxModelFile {
    /// Per-feature mean subtracted before inference.
    scaler_mean: Vec<f32>,
    /// Per-feature scale divided out before inference.
    scaler_scale: Vec<f32>,
    /// One weight row per label, each `FEATURE_COUNT` long.
    weights: Vec<Vec<f32>>,
    /// One bias per label.
    biases: Vec<f32>,
}

/// Failure while loading a model file.
#[derive(Debug, thiserror::Error)]
pub enum SoftmaxModelError {
    /// A file could not be read.
    #[error("model file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The model file was not valid JSON.
    #[error("model file malformed: {0}")]
    Format(#[from] serde_json::Error),
    /// The file's array shapes disagree with the label set.
    #[error("model shape mismatch: {0}")]
    Shape(String),
}

/// Scaler + dense layer + softmax over the label set.
///
/// # Example
///
/// ```rust
/// use rs_sortz::hal::SoftmaxModel;
/// use rs_sortz::traits::{ColorModel, LabelSet};
///
/// // Identity scaler, one dominant weight per label.
/// let mut model = SoftmaxModel::new(
///     LabelSet::parse("R\nG"),
///     vec![0.0; 8],
///     vec![1.0; 8],
///     vec![vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
///          vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
///     vec![0.0, 0.0],
/// )
/// .unwrap();
///
/// let dist = model.infer(&[3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
/// assert!(dist[0] > dist[1]);
/// ```
#[derive(Debug, Clone)]
pub struct SoftmaxModel {
    labels: LabelSet,
    scaler_mean: [f32; FEATURE_COUNT],
    scaler_scale: [f32; FEATURE_COUNT],
    weights: Vec<[f32; FEATURE_COUNT]>,
    biases: Vec<f32>,
}

impl SoftmaxModel {
    /// Builds a model, validating every array shape against the labels.
    pub fn new(
        labels: LabelSet,
        scaler_mean: Vec<f32>,
        scaler_scale: Vec<f32>,
        weights: Vec<Vec<f32>>,
        biases: Vec<f32>,
    ) -> Result<Self, SoftmaxModelError> {
        let scaler_mean = fixed_features("scaler_mean", scaler_mean)?;
        let scaler_scale = fixed_features("scaler_scale", scaler_scale)?;

        if weights.len() != labels.len() {
            return Err(SoftmaxModelError::Shape(format!(
                "{} weight rows for {} labels",
                weights.len(),
                labels.len()
            )));
        }
        if biases.len() != labels.len() {
            return Err(SoftmaxModelError::Shape(format!(
                "{} biases for {} labels",
                biases.len(),
                labels.len()
            )));
        }
        let weights = weights
            .into_iter()
            .map(|row| fixed_features("weights row", row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            labels,
            scaler_mean,
            scaler_scale,
            weights,
            biases,
        })
    }

    /// Loads the model weights and the label list from their files.
    pub fn from_files(
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> Result<Self, SoftmaxModelError> {
        let labels = LabelSet::parse(&fs::read_to_string(labels_path)?);
        let file: SoftmaxModelFile = serde_json::from_str(&fs::read_to_string(model_path)?)?;
        Self::new(
            labels,
            file.scaler_mean,
            file.scaler_scale,
            file.weights,
            file.biases,
        )
    }

    fn scale(&self, features: &FeatureVector) -> [f32; FEATURE_COUNT] {
        let mut scaled = [0.0f32; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let scale = if self.scaler_scale[i] == 0.0 {
                1.0
            } else {
                self.scaler_scale[i]
            };
            scaled[i] = (features[i] - self.scaler_mean[i]) / scale;
        }
        scaled
    }
}

fn fixed_features(name: &str, values: Vec<f32>) -> Result<[f32; FEATURE_COUNT], SoftmaxModelError> {
    <[f32; FEATURE_COUNT]>::try_from(values).map_err(|v: Vec<f32>| {
        SoftmaxModelError::Shape(format!("{name} has {} entries, expected {FEATURE_COUNT}", v.len()))
    })
}

impl ColorModel for SoftmaxModel {
    type Error = Infallible;

    fn infer(&mut self, features: &FeatureVector) -> Result<Vec<f32>, Infallible> {
        let x = self.scale(features);

        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(self.biases.iter())
            .map(|(row, bias)| row.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f32>() + bias)
            .collect();

        // Softmax with max subtraction for numerical stability.
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}
