//! Integration tests for background calibration and profile persistence

use std::fs;
use std::path::PathBuf;

use rs_sortz::{
    calibrate_background,
    hal::{MockColorSensor, MockDelay, MockModel},
    BackgroundProfile, Classification, ClassificationGate, LabelSet, ProfileStoreError,
    SensorSample,
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rs-sortz-{}-{}", std::process::id(), name))
}

#[test]
fn profile_round_trips_exactly() {
    let profile = BackgroundProfile {
        mean: [123.456, 78.9, 0.001, 4096.0],
        std_dev: [1.5, 0.0, 33.25, 7.125],
        threshold_multiplier: 2.5,
    };

    let path = temp_path("roundtrip.json");
    profile.save(&path).unwrap();
    let loaded = BackgroundProfile::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(loaded, profile);
}

#[test]
fn missing_profile_file_is_an_io_error() {
    let result = BackgroundProfile::load(temp_path("does-not-exist.json"));
    assert!(matches!(result, Err(ProfileStoreError::Io(_))));
}

#[test]
fn malformed_profile_file_is_a_format_error() {
    let path = temp_path("garbage.json");
    fs::write(&path, "not json at all").unwrap();
    let result = BackgroundProfile::load(&path);
    fs::remove_file(&path).ok();

    assert!(matches!(result, Err(ProfileStoreError::Format(_))));
}

#[test]
fn calibrated_profile_feeds_the_classification_gate() {
    // Calibrate against a steady empty-belt reading.
    let belt = SensorSample::rgbc(90, 95, 88, 270);
    let mut sensor = MockColorSensor::constant(belt.clone());
    let mut delay = MockDelay::new();
    let profile = calibrate_background(&mut sensor, &mut delay, 20, 100, 3.0).unwrap();

    // The same reading through the gate is rejected without inference...
    let gate_sensor = MockColorSensor::constant(belt);
    let model = MockModel::new(LabelSet::parse("R\nG\nB"), vec![1.0, 0.0, 0.0]);
    let mut gate = ClassificationGate::new(gate_sensor, model).with_profile(Some(profile));
    assert_eq!(gate.classify().unwrap(), Classification::Background);

    // ...while a clearly different object reading is classified.
    gate.sensor_mut().script(vec![SensorSample::rgbc(200, 30, 20, 260)]);
    assert!(matches!(
        gate.classify().unwrap(),
        Classification::Classified { .. }
    ));
}

#[test]
fn no_profile_means_nothing_is_background() {
    // Fail open: with no profile, even a belt-like reading goes to the model.
    let sensor = MockColorSensor::constant(SensorSample::rgbc(90, 95, 88, 270));
    let model = MockModel::new(LabelSet::parse("R\nG\nB"), vec![0.6, 0.3, 0.1]);
    let mut gate = ClassificationGate::new(sensor, model);

    assert!(matches!(
        gate.classify().unwrap(),
        Classification::Classified { .. }
    ));
}

#[test]
fn recalibration_replaces_the_profile() {
    let sensor = MockColorSensor::constant(SensorSample::rgbc(90, 95, 88, 270));
    let model = MockModel::new(LabelSet::parse("R\nG\nB"), vec![1.0, 0.0, 0.0]);
    let mut gate = ClassificationGate::new(sensor, model);
    assert!(gate.profile().is_none());

    let mut cal_sensor = MockColorSensor::constant(SensorSample::rgbc(90, 95, 88, 270));
    let mut delay = MockDelay::new();
    let profile = calibrate_background(&mut cal_sensor, &mut delay, 5, 0, 3.0).unwrap();

    gate.set_profile(profile);
    assert!(gate.profile().is_some());
    assert_eq!(gate.classify().unwrap(), Classification::Background);
}
