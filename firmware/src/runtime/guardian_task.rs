use defmt::{Display2Format, debug, error};
use drive_core::{DriveConfig, GuardianTick, OvercurrentGuardian};
use embassy_time::Ticker;

use super::{Bridge, DriveEvent, EVENTS};
use crate::hw::{FaultLed, SenseAdc};
use crate::status;
use crate::timing::to_embassy;

/// Samples one channel per period until a fault latches, then stops.
#[embassy_executor::task]
pub async fn run(
    bridge: &'static Bridge,
    mut sense: SenseAdc<'static>,
    mut led: FaultLed<'static>,
    config: DriveConfig,
) {
    let mut guardian = OvercurrentGuardian::new(config.debounce_ticks);
    let mut ticker = Ticker::every(to_embassy(config.guardian_period));

    loop {
        ticker.next().await;
        let outcome = guardian.tick(&mut sense, bridge, &mut led);
        status::record_guardian_sample();

        match outcome {
            GuardianTick::Clean(_) => {}
            GuardianTick::Suspect { channel, count } => {
                debug!("overcurrent suspect on {}: {}", Display2Format(&channel), count);
            }
            GuardianTick::Tripped(channel) => {
                error!("overcurrent latched on channel {}", Display2Format(&channel));
                status::record_trip(channel);
                EVENTS.signal(DriveEvent::Tripped(channel));
                return;
            }
            GuardianTick::Halted => return,
        }
    }
}
