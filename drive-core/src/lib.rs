#![no_std]

// Control logic for the two-motor drive base.
//
// Everything here is hardware agnostic: the firmware and the host emulator
// plug their own actuator, sensing, timing, and restart adapters into the
// traits exposed by each module.

pub mod actuator;
pub mod config;
pub mod guardian;
pub mod maneuver;
pub mod mission;
pub mod watchdog;

pub use actuator::{
    ActuationError, BridgeCommand, BridgeDriver, Channel, DirectionSignal, SharedBridge,
};
pub use config::{ConfigError, DriveConfig};
pub use guardian::{
    CurrentSense, FaultIndicator, GuardianState, GuardianTick, OvercurrentGuardian,
};
pub use maneuver::{Maneuver, ManeuverKind, MotionPrimitives};
pub use mission::{HoldTimer, MissionReport, MissionScript, MissionStep};
pub use watchdog::{ButtonInput, HoldTick, ResetPolicy, ResetWatchdog, RestartHandle};
