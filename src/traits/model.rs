//! Classifier boundary: ordered label set and model inference.
//!
//! The trained classification engine lives outside this crate. The
//! control loop only depends on [`ColorModel`]: it hands over an
//! 8-element feature vector and gets back a probability distribution
//! over a fixed, ordered label set. Which engine produces that
//! distribution (the bundled softmax adapter, a test stub, or a real
//! inference runtime) is invisible to the control loop.

/// Number of features the classifier consumes.
///
/// Three channel-to-sum ratios, three channel-to-clear ratios, color
/// temperature, and luminance, in that order.
pub const FEATURE_COUNT: usize = 8;

/// A feature vector as handed to the classifier.
pub type FeatureVector = [f32; FEATURE_COUNT];

/// The ordered set of labels a model can emit.
///
/// Label order is the contract between the model and the control loop:
/// position `i` of an inference result is the probability of label `i`.
///
/// # Example
///
/// ```rust
/// use rs_sortz::traits::LabelSet;
///
/// let labels = LabelSet::parse("R\nG\nB\n");
/// assert_eq!(labels.len(), 3);
/// assert_eq!(labels.get(1), Some("G"));
///
/// let (label, confidence) = labels.argmax(&[0.1, 0.7, 0.2]).unwrap();
/// assert_eq!(label, "G");
/// assert!((confidence - 0.7).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Creates a label set from an ordered list.
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parses a label set from text, one label per line.
    ///
    /// Lines are trimmed; empty lines are skipped. This is the format of
    /// the label file exported next to the trained model.
    pub fn parse(text: &str) -> Self {
        let labels = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self { labels }
    }

    /// Returns the label at the given index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the set holds no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates over the labels in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Picks the most probable label from a distribution.
    ///
    /// Returns the label and its probability, or `None` if the
    /// distribution (or the set) is empty. Ties resolve to the first
    /// maximum.
    pub fn argmax(&self, distribution: &[f32]) -> Option<(&str, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in distribution.iter().enumerate().take(self.labels.len()) {
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((i, p)),
            }
        }
        best.map(|(i, p)| (self.labels[i].as_str(), p))
    }
}

/// Classification model boundary.
///
/// Takes the raw feature vector (unscaled; any feature scaling the
/// trained model needs is the implementation's own concern) and returns
/// a probability distribution in label order.
pub trait ColorModel {
    /// Error type for inference.
    type Error;

    /// Runs inference over one feature vector.
    fn infer(&mut self, features: &FeatureVector) -> Result<Vec<f32>, Self::Error>;

    /// The ordered label set this model predicts over.
    fn labels(&self) -> &LabelSet;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blank_lines() {
        let labels = LabelSet::parse("R\n\n  G  \nB\n\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("R"));
        assert_eq!(labels.get(1), Some("G"));
        assert_eq!(labels.get(2), Some("B"));
    }

    #[test]
    fn argmax_picks_highest() {
        let labels = LabelSet::parse("R\nG\nB");
        let (label, p) = labels.argmax(&[0.05, 0.15, 0.8]).unwrap();
        assert_eq!(label, "B");
        assert!((p - 0.8).abs() < 1e-6);
    }

    #[test]
    fn argmax_tie_resolves_to_first() {
        let labels = LabelSet::parse("R\nG");
        let (label, _) = labels.argmax(&[0.5, 0.5]).unwrap();
        assert_eq!(label, "R");
    }

    #[test]
    fn argmax_empty_distribution_is_none() {
        let labels = LabelSet::parse("R\nG");
        assert!(labels.argmax(&[]).is_none());
    }

    #[test]
    fn argmax_ignores_probabilities_beyond_label_count() {
        let labels = LabelSet::parse("R\nG");
        let (label, _) = labels.argmax(&[0.1, 0.2, 0.9]).unwrap();
        assert_eq!(label, "G");
    }
}
