//! GPIO pin implementations over `rppal`.

use std::convert::Infallible;

use rppal::gpio::{Gpio, InputPin, Level as PinLevel, OutputPin};

use crate::traits::{CoilOutput, Level, PresenceSensor};

/// The four stepper coil lines on Raspberry Pi GPIO.
///
/// Pins are claimed as outputs and driven low at construction, so the
/// motor starts de-energized.
pub struct RpiCoils {
    pins: [OutputPin; 4],
}

impl RpiCoils {
    /// Claims the four coil pins (BCM numbering, phase-table order).
    pub fn new(gpio: &Gpio, bcm: [u8; 4]) -> Result<Self, rppal::gpio::Error> {
        let pins = [
            gpio.get(bcm[0])?.into_output_low(),
            gpio.get(bcm[1])?.into_output_low(),
            gpio.get(bcm[2])?.into_output_low(),
            gpio.get(bcm[3])?.into_output_low(),
        ];
        Ok(Self { pins })
    }
}

impl CoilOutput for RpiCoils {
    type Error = Infallible;

    fn set_pattern(&mut self, pattern: [bool; 4]) -> Result<(), Infallible> {
        for (pin, on) in self.pins.iter_mut().zip(pattern) {
            pin.write(if on { PinLevel::High } else { PinLevel::Low });
        }
        Ok(())
    }
}

/// One IR presence line on Raspberry Pi GPIO.
///
/// The sensor board drives the line low while its beam is broken.
pub struct RpiLine {
    pin: InputPin,
}

impl RpiLine {
    /// Claims the sensor pin as an input (BCM numbering).
    pub fn new(gpio: &Gpio, bcm: u8) -> Result<Self, rppal::gpio::Error> {
        Ok(Self {
            pin: gpio.get(bcm)?.into_input(),
        })
    }
}

impl PresenceSensor for RpiLine {
    type Error = Infallible;

    fn level(&mut self) -> Result<Level, Infallible> {
        Ok(if self.pin.is_low() {
            Level::Low
        } else {
            Level::High
        })
    }
}
