//! Raspberry Pi sorting station controller.
//!
//! This is the main entry point for the physical station. It:
//! - Claims the GPIO lines for the stepper coils and the IR sensor(s)
//! - Brings up the TCS34725 color sensor over I²C
//! - Loads the classifier weights and label list
//! - Loads the saved background profile, or calibrates a fresh one
//! - Runs one full gate revolution to validate the mechanical range
//! - Polls until Ctrl-C, then forces the coils low and exits cleanly
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features rpi --bin rpi_main
//! ```
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=info ./target/release/rpi_main
//! ```

use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use rppal::gpio::Gpio;
use rppal::i2c::I2c;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rs_sortz::background::{calibrate_background, BackgroundProfile};
use rs_sortz::classify::ClassificationGate;
use rs_sortz::config::{CalibrationConfig, StationConfig};
use rs_sortz::gate::{GateController, SlotMap};
use rs_sortz::hal::{RpiCoils, RpiColorSensor, RpiLine, SoftmaxModel, StdDelay};
use rs_sortz::sequencer::MotionSequencer;
use rs_sortz::station::{SortingStation, StationMode};
use rs_sortz::traits::{ColorModel, ColorSensor, Delay};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!();
    println!("================================");
    println!("  rs-sortz station controller");
    println!("================================");
    println!();

    let config = StationConfig::default();

    // =========================================================================
    // Hardware acquisition: any failure here exits non-zero
    // =========================================================================
    let gpio = Gpio::new().context("opening the GPIO chip")?;

    let coils = RpiCoils::new(&gpio, config.pins.motor).context("claiming motor coil pins")?;
    println!("[OK] Motor coils claimed (BCM {:?})", config.pins.motor);

    let i2c = I2c::new().context("opening the I2C bus")?;
    let mut sensor = RpiColorSensor::new(i2c)
        .map_err(|e| anyhow::anyhow!("color sensor init failed: {e:?}"))?;
    println!("[OK] Color sensor initialized");

    let model = SoftmaxModel::from_files(
        config.model.model_path.as_str(),
        config.model.labels_path.as_str(),
    )
    .context("loading classifier files")?;
    println!("[OK] Classifier loaded ({} labels)", model.labels().len());

    match config.run.mode {
        StationMode::Single => {
            println!("[OK] Mode: single sensor (BCM {})", config.pins.ir_drop);
        }
        StationMode::Pipelined => {
            println!(
                "[OK] Mode: pipelined (color BCM {}, drop BCM {})",
                config.pins.ir_color, config.pins.ir_drop
            );
        }
    }
    println!();

    // =========================================================================
    // Background profile
    // =========================================================================
    let mut delay = StdDelay;
    let profile = load_or_calibrate(&mut sensor, &mut delay, &config.calibration)?;

    // =========================================================================
    // Gate range calibration
    // =========================================================================
    let sequencer = MotionSequencer::new(coils, StdDelay)
        .with_step_delay_us(config.motor.step_delay_us);
    let mut controller = GateController::new(sequencer, SlotMap::default())
        .with_steps_per_quarter(config.motor.steps_per_quarter)
        .with_calibration_dwell_ms(config.motor.calibration_dwell_ms);
    controller.calibrate()?;
    println!("[OK] Gate calibrated to home");

    // =========================================================================
    // Station assembly and control loop
    // =========================================================================
    let gate = ClassificationGate::new(sensor, model).with_profile(Some(profile));

    let mut station = match config.run.mode {
        StationMode::Single => {
            let line = RpiLine::new(&gpio, config.pins.ir_drop).context("claiming IR sensor pin")?;
            SortingStation::single(gate, controller, line)
        }
        StationMode::Pipelined => {
            let color_line =
                RpiLine::new(&gpio, config.pins.ir_color).context("claiming color IR pin")?;
            let drop_line =
                RpiLine::new(&gpio, config.pins.ir_drop).context("claiming drop IR pin")?;
            SortingStation::pipelined(gate, controller, color_line, drop_line)
        }
    }
    .with_overflow_policy(config.run.overflow_policy)
    .with_poll_interval_ms(config.run.poll_interval_ms);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("installing the Ctrl-C handler")?;

    println!("Station ready. Press Ctrl-C to stop.");
    println!();

    station.run(&shutdown)?;

    let stats = station.stats();
    info!(
        ticks = stats.ticks,
        sorted = stats.sorted,
        background_rejects = stats.background_rejects,
        empty_drops = stats.empty_drops,
        overflows = station.queue_overflows(),
        "station stopped"
    );
    println!("GPIO released. Bye.");
    Ok(())
}

/// Loads the saved background profile, or calibrates a fresh one.
///
/// A found profile is offered for recalibration; an unreadable profile
/// falls back to calibration. A failed save only costs the next startup
/// a recalibration, so it is logged and otherwise ignored.
fn load_or_calibrate<S, D>(
    sensor: &mut S,
    delay: &mut D,
    cal: &CalibrationConfig,
) -> anyhow::Result<BackgroundProfile>
where
    S: ColorSensor,
    S::Error: std::fmt::Debug,
    D: Delay,
{
    let path = Path::new(cal.profile_path.as_str());

    if path.exists() {
        match BackgroundProfile::load(path) {
            Ok(profile) => {
                info!(
                    r_mean = profile.mean[0],
                    g_mean = profile.mean[1],
                    b_mean = profile.mean[2],
                    "background profile loaded"
                );
                if !prompt_yes("Recalibrate the background? (y/N): ")? {
                    return Ok(profile);
                }
            }
            Err(err) => warn!(error = %err, "saved profile unreadable; recalibrating"),
        }
    } else {
        info!("no saved background profile found");
    }

    println!("Make sure the conveyor is empty, then press Enter.");
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    let profile = calibrate_background(
        sensor,
        delay,
        cal.sample_count,
        cal.sample_interval_ms,
        cal.threshold_multiplier,
    )
    .map_err(|e| anyhow::anyhow!("background calibration failed: {e:?}"))?;

    if let Err(err) = profile.save(path) {
        warn!(error = %err, "could not save the background profile");
    } else {
        info!(path = cal.profile_path.as_str(), "background profile saved");
    }
    Ok(profile)
}

/// Asks a yes/no question on stdout; default is no.
fn prompt_yes(question: &str) -> anyhow::Result<bool> {
    print!("{question}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
