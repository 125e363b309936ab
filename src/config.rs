//! Station configuration.
//!
//! Uses `heapless::String` for path and name fields so config values stay
//! fixed-size and copyable around the control loop.
//!
//! # Example
//!
//! ```rust
//! use rs_sortz::config::{CalibrationConfig, PinConfig, StationConfig};
//!
//! // Use defaults
//! let config = StationConfig::default();
//! assert_eq!(config.pins.ir_drop, 23);
//!
//! // Or customize
//! let config = StationConfig::default()
//!     .with_pins(PinConfig::default().with_motor([5, 6, 13, 19]))
//!     .with_calibration(CalibrationConfig::default().with_sample_count(40));
//! ```

use heapless::String as HString;

use crate::queue::OverflowPolicy;
use crate::station::StationMode;

/// Maximum length for path config strings.
pub const MAX_PATH_STRING: usize = 128;

/// Type alias for path config strings.
pub type PathString = HString<MAX_PATH_STRING>;

/// Create a PathString from a &str, truncating if too long
pub fn path_string(s: &str) -> PathString {
    let mut hs = PathString::new();
    let take = s.len().min(MAX_PATH_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, _)| *i < take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete station configuration
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct StationConfig {
    /// GPIO pin assignments
    pub pins: PinConfig,
    /// Stepper motor timing
    pub motor: MotorConfig,
    /// Background calibration parameters
    pub calibration: CalibrationConfig,
    /// Classifier file locations
    pub model: ModelConfig,
    /// Control loop behavior
    pub run: LoopConfig,
}

impl StationConfig {
    /// Set pin assignments
    pub fn with_pins(mut self, pins: PinConfig) -> Self {
        self.pins = pins;
        self
    }

    /// Set motor timing
    pub fn with_motor(mut self, motor: MotorConfig) -> Self {
        self.motor = motor;
        self
    }

    /// Set calibration parameters
    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    /// Set classifier file locations
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// Set control loop behavior
    pub fn with_run(mut self, run: LoopConfig) -> Self {
        self.run = run;
        self
    }
}

// ============================================================================
// Pin Config
// ============================================================================

/// GPIO pin assignments (BCM numbering)
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PinConfig {
    /// Drop-point IR sensor line (also the only line in single mode)
    pub ir_drop: u8,
    /// Upstream color IR sensor line (pipelined mode)
    pub ir_color: u8,
    /// The four stepper coil lines, in phase-table order
    pub motor: [u8; 4],
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            ir_drop: 23,
            ir_color: 24,
            motor: [17, 18, 27, 22],
        }
    }
}

impl PinConfig {
    /// Set the drop sensor pin
    pub fn with_ir_drop(mut self, pin: u8) -> Self {
        self.ir_drop = pin;
        self
    }

    /// Set the color sensor pin
    pub fn with_ir_color(mut self, pin: u8) -> Self {
        self.ir_color = pin;
        self
    }

    /// Set the four motor coil pins
    pub fn with_motor(mut self, pins: [u8; 4]) -> Self {
        self.motor = pins;
        self
    }
}

// ============================================================================
// Motor Config
// ============================================================================

/// Stepper motor timing configuration
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MotorConfig {
    /// Motor steps per quarter-turn of the gate
    pub steps_per_quarter: u32,
    /// Hold per half-step phase in microseconds
    pub step_delay_us: u64,
    /// Settle pause between calibration turns in milliseconds
    pub calibration_dwell_ms: u64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            steps_per_quarter: 128,
            step_delay_us: 1_000,
            calibration_dwell_ms: 500,
        }
    }
}

impl MotorConfig {
    /// Set the steps per quarter-turn
    pub fn with_steps_per_quarter(mut self, steps: u32) -> Self {
        self.steps_per_quarter = steps;
        self
    }

    /// Set the per-phase hold
    pub fn with_step_delay_us(mut self, us: u64) -> Self {
        self.step_delay_us = us;
        self
    }

    /// Set the calibration settle pause
    pub fn with_calibration_dwell_ms(mut self, ms: u64) -> Self {
        self.calibration_dwell_ms = ms;
        self
    }
}

// ============================================================================
// Calibration Config
// ============================================================================

/// Background calibration parameters
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CalibrationConfig {
    /// Empty-belt samples per calibration run
    pub sample_count: usize,
    /// Pause between samples in milliseconds
    pub sample_interval_ms: u64,
    /// Tolerance multiplier applied to channel deviations
    pub threshold_multiplier: f32,
    /// Where the calibrated profile is persisted
    pub profile_path: PathString,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_count: 20,
            sample_interval_ms: 100,
            threshold_multiplier: 3.0,
            profile_path: path_string("background_profile.json"),
        }
    }
}

impl CalibrationConfig {
    /// Set the sample count
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the inter-sample pause
    pub fn with_sample_interval_ms(mut self, ms: u64) -> Self {
        self.sample_interval_ms = ms;
        self
    }

    /// Set the tolerance multiplier
    pub fn with_threshold_multiplier(mut self, multiplier: f32) -> Self {
        self.threshold_multiplier = multiplier;
        self
    }

    /// Set the profile file path
    pub fn with_profile_path(mut self, path: &str) -> Self {
        self.profile_path = path_string(path);
        self
    }
}

// ============================================================================
// Model Config
// ============================================================================

/// Classifier file locations
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ModelConfig {
    /// Model weights file
    pub model_path: PathString,
    /// Label list, one label per line
    pub labels_path: PathString,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: path_string("color_model.json"),
            labels_path: path_string("labels.txt"),
        }
    }
}

impl ModelConfig {
    /// Set the model weights path
    pub fn with_model_path(mut self, path: &str) -> Self {
        self.model_path = path_string(path);
        self
    }

    /// Set the labels path
    pub fn with_labels_path(mut self, path: &str) -> Self {
        self.labels_path = path_string(path);
        self
    }
}

// ============================================================================
// Loop Config
// ============================================================================

/// Control loop behavior
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LoopConfig {
    /// Operating mode
    pub mode: StationMode,
    /// Pause between poll iterations in milliseconds
    pub poll_interval_ms: u64,
    /// What to do when the pending queue is full
    pub overflow_policy: OverflowPolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            mode: StationMode::Single,
            poll_interval_ms: 50,
            overflow_policy: OverflowPolicy::Warn,
        }
    }
}

impl LoopConfig {
    /// Set the operating mode
    pub fn with_mode(mut self, mode: StationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the overflow policy
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StationConfig::default();
        assert_eq!(config.pins.ir_drop, 23);
        assert_eq!(config.pins.ir_color, 24);
        assert_eq!(config.pins.motor, [17, 18, 27, 22]);
        assert_eq!(config.motor.steps_per_quarter, 128);
        assert_eq!(config.calibration.sample_count, 20);
        assert_eq!(config.run.mode, StationMode::Single);
    }

    #[test]
    fn builder_pattern() {
        let config = StationConfig::default()
            .with_pins(PinConfig::default().with_ir_drop(5).with_motor([1, 2, 3, 4]))
            .with_motor(MotorConfig::default().with_steps_per_quarter(64))
            .with_run(LoopConfig::default().with_mode(StationMode::Pipelined));

        assert_eq!(config.pins.ir_drop, 5);
        assert_eq!(config.pins.motor, [1, 2, 3, 4]);
        assert_eq!(config.motor.steps_per_quarter, 64);
        assert_eq!(config.run.mode, StationMode::Pipelined);
    }

    #[test]
    fn calibration_defaults() {
        let cal = CalibrationConfig::default();
        assert_eq!(cal.sample_interval_ms, 100);
        assert_eq!(cal.threshold_multiplier, 3.0);
        assert_eq!(cal.profile_path.as_str(), "background_profile.json");
    }

    #[test]
    fn path_string_truncation() {
        let long_input = "a".repeat(200);
        let s = path_string(&long_input);
        assert!(s.len() <= MAX_PATH_STRING);
    }

    #[test]
    fn path_string_utf8_boundary() {
        let input = "ő".repeat(100); // 2 bytes each
        let s = path_string(&input);
        assert!(s.len() <= MAX_PATH_STRING);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn config_round_trips_as_json() {
        let config = StationConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: StationConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.pins.motor, config.pins.motor);
        assert_eq!(back.run.mode, config.run.mode);
    }
}
