use defmt::{Display2Format, info, warn};
use drive_core::mission::DRIVE_THEN_PIVOT;
use drive_core::{ActuationError, Maneuver, MotionPrimitives};

use super::{Bridge, DriveEvent, EVENTS};
use crate::status;
use crate::timing::EmbassyHoldTimer;

/// Logs every maneuver on its way to the bridge.
struct LoggedMotion<'a> {
    bridge: &'a Bridge,
}

impl MotionPrimitives for LoggedMotion<'_> {
    fn apply(&self, maneuver: Maneuver) -> Result<(), ActuationError> {
        let result = self.bridge.apply(maneuver);
        match result {
            Ok(()) => info!(
                "maneuver {} at duty {}",
                Display2Format(&maneuver.kind),
                maneuver.duty
            ),
            Err(err) => warn!(
                "maneuver {} refused: {}",
                Display2Format(&maneuver.kind),
                Display2Format(&err)
            ),
        }
        result
    }

    fn stop_outputs(&self) -> Result<(), ActuationError> {
        self.bridge.stop_outputs()
    }
}

/// Runs the mission once, then idles reporting sampler events.
#[embassy_executor::task]
pub async fn run(bridge: &'static Bridge) -> ! {
    let motion = LoggedMotion { bridge };
    let report = DRIVE_THEN_PIVOT.run(&motion, &mut EmbassyHoldTimer).await;

    if report.preempted() {
        warn!(
            "mission preempted: {} applied, {} refused",
            report.applied, report.rejected
        );
    } else {
        info!("mission complete; outputs zeroed");
    }

    loop {
        match EVENTS.wait().await {
            DriveEvent::Tripped(channel) => {
                let snapshot = status::snapshot();
                warn!(
                    "idle: outputs latched by channel {} after {} samples (recorded {}, button held {})",
                    Display2Format(&channel),
                    snapshot.guardian_samples,
                    snapshot.tripped.map(|latched| latched.index()),
                    snapshot.hold_ticks
                );
            }
        }
    }
}
