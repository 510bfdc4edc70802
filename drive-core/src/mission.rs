//! The hardcoded drive-then-pivot mission.
//!
//! The script drives forward, coasts briefly, pivots right, coasts, and then
//! hard-zeroes both duties. Each step applies its maneuver and then holds for
//! a fixed duration. Holds are never shortened or skipped; an overcurrent
//! trip preempts the mission by latching the bridge, after which every
//! remaining write is refused and counted in the [`MissionReport`].

use core::time::Duration;

use crate::maneuver::{Maneuver, MotionPrimitives};

/// Duty requested for the driving steps, in PWM counts.
///
/// This exceeds the 20 kHz period, so the drive steps run at full duty
/// after clamping.
pub const DRIVE_DUTY: u16 = 800;
/// Time spent driving forward.
pub const FORWARD_HOLD: Duration = Duration::from_millis(1_050);
/// Coasting pause between the forward run and the pivot.
pub const PAUSE_HOLD: Duration = Duration::from_millis(100);
/// Time spent pivoting right.
pub const PIVOT_HOLD: Duration = Duration::from_secs(1);

/// Blocking delay used between mission steps.
#[allow(async_fn_in_trait)]
pub trait HoldTimer {
    /// Returns once `duration` has elapsed.
    async fn hold(&mut self, duration: Duration);
}

/// A maneuver and how long to hold it before the next step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MissionStep {
    pub maneuver: Maneuver,
    pub hold: Duration,
}

impl MissionStep {
    #[must_use]
    pub const fn new(maneuver: Maneuver, hold: Duration) -> Self {
        Self { maneuver, hold }
    }
}

/// Ordered steps of the default mission.
pub const DRIVE_THEN_PIVOT_STEPS: [MissionStep; 4] = [
    MissionStep::new(Maneuver::forward(DRIVE_DUTY), FORWARD_HOLD),
    MissionStep::new(Maneuver::coast(), PAUSE_HOLD),
    MissionStep::new(Maneuver::pivot_right(DRIVE_DUTY), PIVOT_HOLD),
    MissionStep::new(Maneuver::coast(), Duration::ZERO),
];

/// Default mission executed once per boot.
pub const DRIVE_THEN_PIVOT: MissionScript<'static> = MissionScript::new(&DRIVE_THEN_PIVOT_STEPS);

/// Summary of a mission run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MissionReport {
    /// Steps whose maneuver reached the bridge.
    pub applied: usize,
    /// Steps refused because the bridge was latched.
    pub rejected: usize,
    /// Whether the closing hard-zero reached the bridge.
    pub outputs_zeroed: bool,
}

impl MissionReport {
    /// `true` when an overcurrent trip took over before the script finished.
    #[must_use]
    pub const fn preempted(&self) -> bool {
        self.rejected > 0 || !self.outputs_zeroed
    }
}

/// Immutable, ordered list of mission steps.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MissionScript<'a> {
    steps: &'a [MissionStep],
}

impl<'a> MissionScript<'a> {
    #[must_use]
    pub const fn new(steps: &'a [MissionStep]) -> Self {
        Self { steps }
    }

    #[must_use]
    pub const fn steps(&self) -> &'a [MissionStep] {
        self.steps
    }

    /// Sum of every hold in the script.
    #[must_use]
    pub fn total_hold(&self) -> Duration {
        self.steps.iter().map(|step| step.hold).sum()
    }

    /// Executes the script once, in order, then zeroes both duties.
    pub async fn run<P, T>(&self, motion: &P, timer: &mut T) -> MissionReport
    where
        P: MotionPrimitives + ?Sized,
        T: HoldTimer + ?Sized,
    {
        let mut report = MissionReport::default();

        for step in self.steps {
            match motion.apply(step.maneuver) {
                Ok(()) => report.applied += 1,
                Err(_) => report.rejected += 1,
            }
            if !step.hold.is_zero() {
                timer.hold(step.hold).await;
            }
        }

        report.outputs_zeroed = motion.stop_outputs().is_ok();
        report
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use heapless::Vec;

    use super::*;
    use crate::ActuationError;
    use crate::maneuver::ManeuverKind;

    #[test]
    fn default_script_order() {
        let kinds = DRIVE_THEN_PIVOT.steps().iter().map(|step| step.maneuver.kind);
        assert!(kinds.eq([
            ManeuverKind::Forward,
            ManeuverKind::Coast,
            ManeuverKind::PivotRight,
            ManeuverKind::Coast,
        ]));
    }

    #[test]
    fn default_script_holds() {
        assert_eq!(DRIVE_THEN_PIVOT.total_hold(), Duration::from_millis(2_150));
        assert_eq!(DRIVE_THEN_PIVOT_STEPS[0].maneuver.duty, DRIVE_DUTY);
        assert_eq!(DRIVE_THEN_PIVOT_STEPS[2].maneuver.duty, DRIVE_DUTY);
    }

    #[derive(Default)]
    struct Script {
        applied: RefCell<Vec<Maneuver, 8>>,
        stops: RefCell<usize>,
    }

    impl MotionPrimitives for Script {
        fn apply(&self, maneuver: Maneuver) -> Result<(), ActuationError> {
            self.applied
                .borrow_mut()
                .push(maneuver)
                .expect("script fits in capacity");
            Ok(())
        }

        fn stop_outputs(&self) -> Result<(), ActuationError> {
            *self.stops.borrow_mut() += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Holds(Vec<Duration, 8>);

    impl HoldTimer for Holds {
        async fn hold(&mut self, duration: Duration) {
            self.0.push(duration).expect("holds fit in capacity");
        }
    }

    #[test]
    fn run_applies_steps_then_stops_once() {
        let motion = Script::default();
        let mut holds = Holds::default();

        let report = embassy_futures::block_on(DRIVE_THEN_PIVOT.run(&motion, &mut holds));

        assert_eq!(
            report,
            MissionReport {
                applied: 4,
                rejected: 0,
                outputs_zeroed: true,
            }
        );
        let applied = motion.applied.borrow();
        assert!(applied
            .iter()
            .copied()
            .eq(DRIVE_THEN_PIVOT_STEPS.iter().map(|step| step.maneuver)));
        assert_eq!(*motion.stops.borrow(), 1);
        assert_eq!(holds.0.as_slice(), &[FORWARD_HOLD, PAUSE_HOLD, PIVOT_HOLD]);
    }

    #[test]
    fn report_flags_preemption() {
        let clean = MissionReport {
            applied: 4,
            rejected: 0,
            outputs_zeroed: true,
        };
        assert!(!clean.preempted());

        let tripped = MissionReport {
            applied: 1,
            rejected: 3,
            outputs_zeroed: false,
        };
        assert!(tripped.preempted());
    }
}
