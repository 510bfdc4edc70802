mod support;

use drive_core::watchdog::{HoldTick, ResetPolicy, ResetWatchdog};
use proptest::prelude::*;

use support::{RestartCounter, ScriptedButton, first_run_completion};

#[test]
fn ten_pressed_samples_restart_on_the_tenth() {
    let mut button = ScriptedButton::new(&[true; 10]);
    let mut restart = RestartCounter::default();
    let mut watchdog = ResetWatchdog::new(10, ResetPolicy::AlwaysArmed);

    for expected in 1..=9 {
        assert_eq!(
            watchdog.tick(&mut button, &mut restart, false),
            HoldTick::Holding(expected)
        );
        assert_eq!(restart.restarts, 0);
    }

    assert_eq!(
        watchdog.tick(&mut button, &mut restart, false),
        HoldTick::ResetRequested
    );
    assert_eq!(restart.restarts, 1);
}

#[test]
fn a_single_release_restarts_the_count() {
    let mut samples = vec![true; 9];
    samples.push(false);
    samples.extend([true; 9]);
    let mut button = ScriptedButton::new(&samples);
    let mut restart = RestartCounter::default();
    let mut watchdog = ResetWatchdog::new(10, ResetPolicy::AlwaysArmed);

    for _ in 0..samples.len() {
        watchdog.tick(&mut button, &mut restart, false);
    }

    assert_eq!(restart.restarts, 0);
    assert_eq!(watchdog.held(), 9);
}

#[test]
fn hold_after_trip_follows_policy() {
    let mut armed = ResetWatchdog::new(2, ResetPolicy::AlwaysArmed);
    let mut disarmed = ResetWatchdog::new(2, ResetPolicy::DisarmedAfterTrip);
    let mut restart = RestartCounter::default();

    let mut button = ScriptedButton::new(&[true, true]);
    armed.tick(&mut button, &mut restart, true);
    armed.tick(&mut button, &mut restart, true);
    assert_eq!(restart.restarts, 1);

    let mut button = ScriptedButton::new(&[true, true, true]);
    for _ in 0..3 {
        assert_eq!(
            disarmed.tick(&mut button, &mut restart, true),
            HoldTick::Disarmed
        );
    }
    assert_eq!(restart.restarts, 1);
}

proptest! {
    /// The first restart request lands exactly on the sample that completes
    /// the first run of M consecutive presses.
    #[test]
    fn restart_iff_hold_threshold_reached(
        samples in proptest::collection::vec(any::<bool>(), 0..64),
        hold in 1u8..=12,
    ) {
        let mut button = ScriptedButton::new(&samples);
        let mut restart = RestartCounter::default();
        let mut watchdog = ResetWatchdog::new(hold, ResetPolicy::AlwaysArmed);

        let mut first_request = None;
        for index in 0..samples.len() {
            if watchdog.tick(&mut button, &mut restart, false) == HoldTick::ResetRequested {
                first_request = Some(index);
                break;
            }
        }

        prop_assert_eq!(first_request, first_run_completion(&samples, usize::from(hold)));
        prop_assert_eq!(restart.restarts, usize::from(first_request.is_some()));
        prop_assert!(watchdog.held() <= hold);
    }
}
