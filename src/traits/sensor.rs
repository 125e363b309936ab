//! Color sensor boundary: raw RGBC readings with optional derived channels.

/// One raw reading from the color sensor.
///
/// The four channels are the sensor's unscaled photodiode counts. Color
/// temperature and luminance are derived values the sensor driver may or
/// may not be able to compute; absence is an expected, common case and is
/// modeled as `None` rather than an error. Samples are ephemeral: they
/// are consumed by the classification gate immediately after the read.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorSample {
    /// Red channel count.
    pub r: u16,
    /// Green channel count.
    pub g: u16,
    /// Blue channel count.
    pub b: u16,
    /// Clear (unfiltered) channel count.
    pub c: u16,
    /// Derived color temperature in Kelvin, if available.
    pub color_temp: Option<f32>,
    /// Derived luminance in lux, if available.
    pub lux: Option<f32>,
}

impl SensorSample {
    /// Creates a sample from the four raw channels, with no derived values.
    pub fn rgbc(r: u16, g: u16, b: u16, c: u16) -> Self {
        Self {
            r,
            g,
            b,
            c,
            color_temp: None,
            lux: None,
        }
    }

    /// Attaches derived color temperature and luminance.
    pub fn with_derived(mut self, color_temp: Option<f32>, lux: Option<f32>) -> Self {
        self.color_temp = color_temp;
        self.lux = lux;
        self
    }
}

/// Color sensor read boundary.
///
/// Implementations must never fail the whole read because a derived
/// channel is unavailable: a failed temperature or lux computation is
/// reported as `None` on the sample, and only a failed raw RGBC read
/// is an error.
pub trait ColorSensor {
    /// Error type for raw reads.
    type Error;

    /// Takes one sample from the sensor.
    fn read(&mut self) -> Result<SensorSample, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgbc_has_no_derived_channels() {
        let sample = SensorSample::rgbc(10, 20, 30, 60);
        assert_eq!(sample.r, 10);
        assert_eq!(sample.c, 60);
        assert!(sample.color_temp.is_none());
        assert!(sample.lux.is_none());
    }

    #[test]
    fn with_derived_attaches_values() {
        let sample = SensorSample::rgbc(1, 2, 3, 6).with_derived(Some(5000.0), Some(120.5));
        assert_eq!(sample.color_temp, Some(5000.0));
        assert_eq!(sample.lux, Some(120.5));
    }
}
