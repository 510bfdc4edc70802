//! Named maneuvers and the lookup table that turns them into bridge commands.

use core::fmt;

use crate::actuator::{ActuationError, BridgeCommand, BridgeDriver, DirectionSignal, SharedBridge};

/// Identifier for each fixed actuation pattern.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ManeuverKind {
    Forward,
    Reverse,
    Coast,
    Brake,
    PivotLeft,
    PivotRight,
}

impl ManeuverKind {
    /// Deterministic index into [`MANEUVER_TABLE`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            ManeuverKind::Forward => 0,
            ManeuverKind::Reverse => 1,
            ManeuverKind::Coast => 2,
            ManeuverKind::Brake => 3,
            ManeuverKind::PivotLeft => 4,
            ManeuverKind::PivotRight => 5,
        }
    }

    /// Table row describing this maneuver.
    #[must_use]
    pub const fn profile(self) -> ManeuverProfile {
        MANEUVER_TABLE[self.as_index()]
    }
}

impl fmt::Display for ManeuverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManeuverKind::Forward => "forward",
            ManeuverKind::Reverse => "reverse",
            ManeuverKind::Coast => "coast",
            ManeuverKind::Brake => "brake",
            ManeuverKind::PivotLeft => "pivot-left",
            ManeuverKind::PivotRight => "pivot-right",
        };
        f.write_str(name)
    }
}

/// Duty scaling and direction pair implied by a maneuver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ManeuverProfile {
    pub kind: ManeuverKind,
    /// `false` forces zero duty regardless of the requested value.
    pub drives: bool,
    pub direction_a: DirectionSignal,
    pub direction_b: DirectionSignal,
}

impl ManeuverProfile {
    const fn new(
        kind: ManeuverKind,
        drives: bool,
        direction_a: DirectionSignal,
        direction_b: DirectionSignal,
    ) -> Self {
        Self {
            kind,
            drives,
            direction_a,
            direction_b,
        }
    }
}

/// Compile-time catalog of every maneuver, indexed by [`ManeuverKind::as_index`].
pub const MANEUVER_TABLE: [ManeuverProfile; 6] = [
    ManeuverProfile::new(
        ManeuverKind::Forward,
        true,
        DirectionSignal::Forward,
        DirectionSignal::Forward,
    ),
    ManeuverProfile::new(
        ManeuverKind::Reverse,
        true,
        DirectionSignal::Reverse,
        DirectionSignal::Reverse,
    ),
    ManeuverProfile::new(
        ManeuverKind::Coast,
        false,
        DirectionSignal::Off,
        DirectionSignal::Off,
    ),
    ManeuverProfile::new(
        ManeuverKind::Brake,
        false,
        DirectionSignal::Brake,
        DirectionSignal::Brake,
    ),
    // Channel A reverses while B drives forward.
    ManeuverProfile::new(
        ManeuverKind::PivotLeft,
        true,
        DirectionSignal::Reverse,
        DirectionSignal::Forward,
    ),
    ManeuverProfile::new(
        ManeuverKind::PivotRight,
        true,
        DirectionSignal::Forward,
        DirectionSignal::Reverse,
    ),
];

/// A maneuver together with the duty it should run at.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Maneuver {
    pub kind: ManeuverKind,
    pub duty: u16,
}

impl Maneuver {
    #[must_use]
    pub const fn new(kind: ManeuverKind, duty: u16) -> Self {
        Self { kind, duty }
    }

    #[must_use]
    pub const fn forward(duty: u16) -> Self {
        Self::new(ManeuverKind::Forward, duty)
    }

    #[must_use]
    pub const fn reverse(duty: u16) -> Self {
        Self::new(ManeuverKind::Reverse, duty)
    }

    #[must_use]
    pub const fn coast() -> Self {
        Self::new(ManeuverKind::Coast, 0)
    }

    #[must_use]
    pub const fn brake() -> Self {
        Self::new(ManeuverKind::Brake, 0)
    }

    #[must_use]
    pub const fn pivot_left(duty: u16) -> Self {
        Self::new(ManeuverKind::PivotLeft, duty)
    }

    #[must_use]
    pub const fn pivot_right(duty: u16) -> Self {
        Self::new(ManeuverKind::PivotRight, duty)
    }

    /// Resolves the maneuver into a bridge command with duty clamped to `period`.
    #[must_use]
    pub fn command(self, period: u16) -> BridgeCommand {
        let profile = self.kind.profile();
        let duty = if profile.drives {
            self.duty.min(period)
        } else {
            0
        };
        BridgeCommand {
            duty: [duty; 2],
            direction: [profile.direction_a, profile.direction_b],
        }
    }
}

/// Actuation surface used by the mission script.
pub trait MotionPrimitives {
    /// Sets both duties and direction pairs for the maneuver.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError::Latched`] when the outputs are latched off.
    fn apply(&self, maneuver: Maneuver) -> Result<(), ActuationError>;

    /// Writes zero duty on both channels.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError::Latched`] when the outputs are latched off.
    fn stop_outputs(&self) -> Result<(), ActuationError>;
}

impl<D: BridgeDriver> MotionPrimitives for SharedBridge<D> {
    fn apply(&self, maneuver: Maneuver) -> Result<(), ActuationError> {
        let period = self.with_driver(D::period);
        self.write(maneuver.command(period))
    }

    fn stop_outputs(&self) -> Result<(), ActuationError> {
        self.zero_duties()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: u16 = 399;

    #[test]
    fn table_rows_are_indexed_by_kind() {
        for (index, profile) in MANEUVER_TABLE.iter().enumerate() {
            assert_eq!(profile.kind.as_index(), index);
        }
    }

    #[test]
    fn pivots_drive_channels_in_opposite_directions() {
        let right = Maneuver::pivot_right(250).command(PERIOD);
        assert_eq!(right.duty, [250, 250]);
        assert_eq!(
            right.direction,
            [DirectionSignal::Forward, DirectionSignal::Reverse]
        );

        let left = Maneuver::pivot_left(250).command(PERIOD);
        assert_eq!(
            left.direction,
            [DirectionSignal::Reverse, DirectionSignal::Forward]
        );
    }

    #[test]
    fn coast_and_brake_ignore_requested_duty() {
        let coast = Maneuver::new(ManeuverKind::Coast, 300).command(PERIOD);
        assert_eq!(coast, BridgeCommand::idle(DirectionSignal::Off));

        let brake = Maneuver::new(ManeuverKind::Brake, 300).command(PERIOD);
        assert_eq!(brake, BridgeCommand::idle(DirectionSignal::Brake));
    }

    #[test]
    fn drive_duty_above_period_is_clamped() {
        let forward = Maneuver::forward(800).command(PERIOD);
        assert_eq!(forward.duty, [PERIOD, PERIOD]);

        let reverse = Maneuver::reverse(u16::MAX).command(PERIOD);
        assert_eq!(reverse.duty, [PERIOD, PERIOD]);
        assert_eq!(reverse.direction, [DirectionSignal::Reverse; 2]);
    }
}
