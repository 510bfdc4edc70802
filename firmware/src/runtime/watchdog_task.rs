use defmt::{debug, info};
use drive_core::{DriveConfig, HoldTick, ResetWatchdog};
use embassy_time::Ticker;

use super::Bridge;
use crate::hw::{ResetButton, SystemReset};
use crate::status;
use crate::timing::to_embassy;

#[embassy_executor::task]
pub async fn run(
    bridge: &'static Bridge,
    mut button: ResetButton<'static>,
    mut restart: SystemReset,
    config: DriveConfig,
) -> ! {
    let mut watchdog = ResetWatchdog::new(config.hold_ticks, config.reset_policy);
    let mut ticker = Ticker::every(to_embassy(config.watchdog_period));

    loop {
        ticker.next().await;
        let outcome = watchdog.tick(&mut button, &mut restart, bridge.is_tripped());
        status::record_hold(watchdog.held());

        match outcome {
            HoldTick::Holding(held) => debug!("reset button held for {} ticks", held),
            HoldTick::Disarmed => info!("reset button ignored while latched"),
            HoldTick::Released | HoldTick::ResetRequested => {}
        }
    }
}
