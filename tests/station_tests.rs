//! Integration tests for the sorting station control loop

use std::sync::atomic::AtomicBool;

use rs_sortz::{
    hal::{MockCoils, MockColorSensor, MockDelay, MockLine, MockModel},
    BackgroundProfile, ClassificationGate, GateController, LabelSet, Level, MotionSequencer,
    Rotation, SensorSample, SlotMap, SortingStation, StationMode, TickEvent,
};

type MockStation =
    SortingStation<MockColorSensor, MockModel, MockCoils, MockDelay, MockLine>;

fn rgb_labels() -> LabelSet {
    LabelSet::parse("R\nG\nB")
}

fn controller() -> GateController<MockCoils, MockDelay> {
    let seq = MotionSequencer::new(MockCoils::new(), MockDelay::new());
    GateController::new(seq, SlotMap::default()).with_steps_per_quarter(1)
}

fn single_station(sample: SensorSample, response: Vec<f32>) -> MockStation {
    let gate = ClassificationGate::new(
        MockColorSensor::constant(sample),
        MockModel::new(rgb_labels(), response),
    );
    SortingStation::single(gate, controller(), MockLine::new())
}

fn pipelined_station(response: Vec<f32>) -> MockStation {
    let gate = ClassificationGate::new(
        MockColorSensor::constant(SensorSample::rgbc(100, 100, 100, 300)),
        MockModel::new(rgb_labels(), response),
    );
    SortingStation::pipelined(gate, controller(), MockLine::new(), MockLine::new())
}

// ============================================================================
// Single-sensor mode
// ============================================================================

#[test]
fn single_sensor_end_to_end() {
    let mut station = single_station(SensorSample::rgbc(50, 200, 40, 300), vec![0.05, 0.92, 0.03]);
    station.color_line_mut().script(&[Level::Low]);

    match station.tick().unwrap() {
        TickEvent::Sorted {
            label,
            confidence,
            rotation,
        } => {
            assert_eq!(label, "G");
            assert!((confidence - 0.92).abs() < 1e-6);
            assert_eq!(
                rotation,
                Rotation::Turned {
                    quarter_turns: 1,
                    to: rs_sortz::Slot::new(1).unwrap()
                }
            );
        }
        other => panic!("expected a sort, got {other:?}"),
    }
    assert_eq!(station.controller().position().index(), 1);
    assert_eq!(station.mode(), StationMode::Single);
}

#[test]
fn repeated_low_reads_trigger_once() {
    let mut station = single_station(SensorSample::rgbc(50, 200, 40, 300), vec![0.0, 1.0, 0.0]);
    station.color_line_mut().script(&[Level::Low, Level::Low, Level::Low]);

    assert!(matches!(station.tick().unwrap(), TickEvent::Sorted { .. }));
    assert!(matches!(station.tick().unwrap(), TickEvent::Idle));
    assert!(matches!(station.tick().unwrap(), TickEvent::Idle));

    let stats = station.stats();
    assert_eq!(stats.classified, 1);
    assert_eq!(stats.sorted, 1);
}

#[test]
fn trigger_rearms_after_the_line_clears() {
    let mut station = single_station(SensorSample::rgbc(50, 200, 40, 300), vec![0.0, 1.0, 0.0]);
    station
        .color_line_mut()
        .script(&[Level::Low, Level::Low, Level::High, Level::Low]);

    assert!(matches!(station.tick().unwrap(), TickEvent::Sorted { .. }));
    assert!(matches!(station.tick().unwrap(), TickEvent::Idle));
    assert!(matches!(station.tick().unwrap(), TickEvent::Idle)); // line clears
    assert!(matches!(station.tick().unwrap(), TickEvent::Sorted { .. }));
    assert_eq!(station.stats().classified, 2);
}

#[test]
fn background_reading_is_rejected_and_rearms_immediately() {
    let profile = BackgroundProfile {
        mean: [100.0, 100.0, 100.0, 300.0],
        std_dev: [5.0, 5.0, 5.0, 10.0],
        threshold_multiplier: 3.0,
    };
    let gate = ClassificationGate::new(
        MockColorSensor::constant(SensorSample::rgbc(100, 100, 100, 300)),
        MockModel::new(rgb_labels(), vec![1.0, 0.0, 0.0]),
    )
    .with_profile(Some(profile));
    let mut station = SortingStation::single(gate, controller(), MockLine::new());

    // Without an intervening high, a rejected trigger still re-arms.
    station.color_line_mut().script(&[Level::Low, Level::Low]);
    assert_eq!(station.tick().unwrap(), TickEvent::BackgroundRejected);
    assert_eq!(station.tick().unwrap(), TickEvent::BackgroundRejected);

    let stats = station.stats();
    assert_eq!(stats.background_rejects, 2);
    assert_eq!(stats.classified, 0);
    // The gate never moved.
    assert!(station.controller().sequencer().coils().writes.is_empty());
}

// ============================================================================
// Pipelined mode
// ============================================================================

#[test]
fn pipelined_end_to_end() {
    let mut station = pipelined_station(vec![0.05, 0.9, 0.05]); // "G"
    assert_eq!(station.mode(), StationMode::Pipelined);

    // Round one: queue G, drop it. The gate moves home -> slot 1.
    station.color_line_mut().script(&[Level::Low, Level::High]);
    station.drop_line_mut().unwrap().script(&[Level::Low]);

    match station.tick().unwrap() {
        TickEvent::Queued { label, depth, .. } => {
            assert_eq!(label, "G");
            assert_eq!(depth, 1);
        }
        other => panic!("expected a queue push, got {other:?}"),
    }
    match station.tick().unwrap() {
        TickEvent::Dropped { label, .. } => assert_eq!(label, "G"),
        other => panic!("expected a drop, got {other:?}"),
    }
    assert_eq!(station.controller().position().index(), 1);
    assert_eq!(station.queue_len(), 0);

    // Round two: queue R at position 1; the drop wraps forward 1 -> 0.
    station.gate_mut().model_mut().set_response(vec![0.9, 0.05, 0.05]);
    station.color_line_mut().script(&[Level::Low, Level::High, Level::High]);
    station.drop_line_mut().unwrap().script(&[Level::High, Level::Low]);

    match station.tick().unwrap() {
        TickEvent::Queued { label, depth, .. } => {
            assert_eq!(label, "R");
            assert_eq!(depth, 1);
        }
        other => panic!("expected a queue push, got {other:?}"),
    }
    // Drop line reads high: its trigger re-arms.
    assert_eq!(station.tick().unwrap(), TickEvent::Idle);
    match station.tick().unwrap() {
        TickEvent::Dropped { label, rotation } => {
            assert_eq!(label, "R");
            assert_eq!(
                rotation,
                Rotation::Turned {
                    quarter_turns: 3,
                    to: rs_sortz::Slot::new(0).unwrap()
                }
            );
        }
        other => panic!("expected a drop, got {other:?}"),
    }
    assert_eq!(station.controller().position().index(), 0);
    assert_eq!(station.queue_len(), 0);
}

#[test]
fn drop_with_empty_queue_is_surfaced_not_fatal() {
    let mut station = pipelined_station(vec![1.0, 0.0, 0.0]);
    station.drop_line_mut().unwrap().script(&[Level::Low]);

    assert_eq!(station.tick().unwrap(), TickEvent::DropWithEmptyQueue);
    assert_eq!(station.stats().empty_drops, 1);
    // No motion was commanded.
    assert!(station.controller().sequencer().coils().writes.is_empty());

    // The loop keeps working afterwards.
    station.color_line_mut().script(&[Level::Low]);
    assert!(matches!(station.tick().unwrap(), TickEvent::Queued { .. }));
}

#[test]
fn queue_overflow_drops_the_eleventh_label() {
    let mut station = pipelined_station(vec![1.0, 0.0, 0.0]);

    // Eleven detections with the line clearing in between; the drop
    // sensor stays idle throughout.
    for _ in 0..11 {
        station.color_line_mut().script(&[Level::Low, Level::High]);
    }

    let mut events = Vec::new();
    for _ in 0..22 {
        events.push(station.tick().unwrap());
    }

    let queued = events
        .iter()
        .filter(|e| matches!(e, TickEvent::Queued { .. }))
        .count();
    let overflowed = events
        .iter()
        .filter(|e| matches!(e, TickEvent::QueueOverflow { .. }))
        .count();
    assert_eq!(queued, 10);
    assert_eq!(overflowed, 1);
    assert_eq!(station.queue_len(), 10);
    assert_eq!(station.queue_overflows(), 1);
}

#[test]
fn same_tick_race_favors_enqueue_over_dequeue() {
    let mut station = pipelined_station(vec![1.0, 0.0, 0.0]);

    // Both lines read low on the first tick: only the color branch runs.
    station.color_line_mut().script(&[Level::Low, Level::High]);
    station.drop_line_mut().unwrap().script(&[Level::Low, Level::Low]);

    assert!(matches!(station.tick().unwrap(), TickEvent::Queued { .. }));
    // Next tick the drop sensor consumes the queued label.
    match station.tick().unwrap() {
        TickEvent::Dropped { label, .. } => assert_eq!(label, "R"),
        other => panic!("expected a drop, got {other:?}"),
    }
}

// ============================================================================
// Run loop
// ============================================================================

#[test]
fn run_releases_coils_on_shutdown() {
    let mut station = single_station(SensorSample::rgbc(1, 1, 1, 3), vec![1.0, 0.0, 0.0]);
    let shutdown = AtomicBool::new(true);

    station.run(&shutdown).unwrap();
    assert_eq!(
        station.controller().sequencer().coils().writes,
        vec![[false; 4]]
    );
}
