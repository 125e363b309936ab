//! TCS34725 color sensor over I²C.

use embedded_hal::i2c::I2c;
use tcs3472::{Error as TcsError, RgbCGain, Tcs3472};

use crate::traits::{ColorSensor, SensorSample};

/// RGBC integration cycles (~2.4 ms each; 21 cycles is roughly 50 ms).
const INTEGRATION_CYCLES: u16 = 21;

/// TCS34725 color sensor bound to an I²C bus.
///
/// Raw RGBC comes straight from the chip. Color temperature and lux are
/// derived on the host from the raw channels, the way the vendor driver
/// does it; when the reading is too dark or degenerate for the formulas,
/// the derived values are reported as absent rather than failing the
/// sample.
pub struct RpiColorSensor<I2C> {
    sensor: Tcs3472<I2C>,
}

impl<I2C, E> RpiColorSensor<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Powers up the sensor and enables RGBC conversion.
    pub fn new(i2c: I2C) -> Result<Self, TcsError<E>> {
        let mut sensor = Tcs3472::new(i2c);
        sensor.enable()?;
        sensor.set_rgbc_gain(RgbCGain::_4x)?;
        sensor.set_integration_cycles(INTEGRATION_CYCLES)?;
        sensor.enable_rgbc()?;
        Ok(Self { sensor })
    }
}

/// McCamy-style color temperature and illuminance from raw channels.
///
/// Returns `(color_temp, lux)`; either is `None` when the raw reading is
/// degenerate (all dark, or the chromaticity denominator collapses).
fn derive_channels(red: u16, green: u16, blue: u16) -> (Option<f32>, Option<f32>) {
    let (r, g, b) = (red as f32, green as f32, blue as f32);

    // RGB to CIE XYZ, coefficients from the sensor vendor's application note.
    let x = -0.14282 * r + 1.54924 * g - 0.95641 * b;
    let y = -0.32466 * r + 1.57837 * g - 0.73191 * b;
    let z = -0.68202 * r + 0.77073 * g + 0.56332 * b;

    let total = x + y + z;
    if total <= 0.0 {
        return (None, None);
    }
    let lux = if y >= 0.0 { Some(y) } else { None };

    let xc = x / total;
    let yc = y / total;
    let denom = 0.1858 - yc;
    if denom.abs() < 1e-6 {
        return (None, lux);
    }
    let n = (xc - 0.3320) / denom;
    let cct = 449.0 * n.powi(3) + 3525.0 * n.powi(2) + 6823.3 * n + 5520.33;
    let temp = if cct.is_finite() && cct > 0.0 {
        Some(cct)
    } else {
        None
    };
    (temp, lux)
}

impl<I2C, E> ColorSensor for RpiColorSensor<I2C>
where
    I2C: I2c<Error = E>,
{
    type Error = TcsError<E>;

    fn read(&mut self) -> Result<SensorSample, Self::Error> {
        let m = self.sensor.read_all_channels()?;
        let (color_temp, lux) = derive_channels(m.red, m.green, m.blue);
        Ok(SensorSample::rgbc(m.red, m.green, m.blue, m.clear).with_derived(color_temp, lux))
    }
}
