//! Integration tests for gate positioning

use rs_sortz::{
    hal::{MockCoils, MockDelay},
    GateController, MotionSequencer, Rotation, SlotMap,
};

/// A label resolving to each slot; "X" is unmapped and lands on the reject slot 3.
const LABEL_FOR_SLOT: [&str; 4] = ["R", "G", "B", "X"];

fn gate() -> GateController<MockCoils, MockDelay> {
    let seq = MotionSequencer::new(MockCoils::new(), MockDelay::new());
    GateController::new(seq, SlotMap::default()).with_steps_per_quarter(1)
}

#[test]
fn rotate_covers_every_start_target_pair() {
    for start in 0..4u8 {
        for target in 0..4u8 {
            let mut gate = gate();
            gate.rotate_to(LABEL_FOR_SLOT[start as usize]).unwrap();
            assert_eq!(gate.position().index(), start);
            let writes_before = gate.sequencer().coils().writes.len();

            let expected = (target + 4 - start) % 4;
            match gate.rotate_to(LABEL_FOR_SLOT[target as usize]).unwrap() {
                Rotation::AlreadyInPosition(slot) => {
                    assert_eq!(expected, 0, "start {start} target {target}");
                    assert_eq!(slot.index(), target);
                    // A no-op issues no pin writes at all.
                    assert_eq!(gate.sequencer().coils().writes.len(), writes_before);
                }
                Rotation::Turned { quarter_turns, to } => {
                    assert_eq!(quarter_turns, expected, "start {start} target {target}");
                    assert_eq!(to.index(), target);
                    // 8 phase writes per quarter-turn, one trailing release.
                    assert_eq!(
                        gate.sequencer().coils().writes.len(),
                        writes_before + expected as usize * 8 + 1
                    );
                }
            }
            assert_eq!(gate.position().index(), target);
        }
    }
}

#[test]
fn rotate_to_current_position_issues_no_motion() {
    let mut gate = gate();
    let outcome = gate.rotate_to("R").unwrap();
    assert!(matches!(outcome, Rotation::AlreadyInPosition(_)));
    assert!(gate.sequencer().coils().writes.is_empty());
}

#[test]
fn calibrate_is_four_turns_from_any_position() {
    for start in 0..4u8 {
        let mut gate = gate();
        gate.rotate_to(LABEL_FOR_SLOT[start as usize]).unwrap();
        let writes_before = gate.sequencer().coils().writes.len();

        gate.calibrate().unwrap();

        assert_eq!(gate.position().index(), 0);
        // 4 quarter-turn advances of (8 phases + release) each.
        assert_eq!(gate.sequencer().coils().writes.len(), writes_before + 4 * 9);
    }
}

#[test]
fn coils_deenergized_after_every_command() {
    let mut gate = gate();
    gate.rotate_to("B").unwrap();
    assert_eq!(gate.sequencer().coils().pattern, [false; 4]);
    gate.calibrate().unwrap();
    assert_eq!(gate.sequencer().coils().pattern, [false; 4]);
}

#[test]
fn unmapped_labels_share_the_reject_slot() {
    let mut gate = gate();
    gate.rotate_to("mystery").unwrap();
    assert_eq!(gate.position().index(), 3);

    // A different unknown label is already "in position".
    let outcome = gate.rotate_to("junk").unwrap();
    assert!(matches!(outcome, Rotation::AlreadyInPosition(_)));
}
