#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Bridges `core::time::Duration` from `drive-core` onto Embassy time.

use embassy_time::Duration;

/// Converts a core duration to Embassy ticks.
pub fn to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

/// Mission hold timer backed by the Embassy time driver.
#[cfg(target_os = "none")]
pub struct EmbassyHoldTimer;

#[cfg(target_os = "none")]
impl drive_core::HoldTimer for EmbassyHoldTimer {
    async fn hold(&mut self, duration: core::time::Duration) {
        embassy_time::Timer::after(to_embassy(duration)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drive_core::config::{GUARDIAN_PERIOD, WATCHDOG_PERIOD};
    use drive_core::mission::FORWARD_HOLD;

    #[test]
    fn tick_periods_convert_exactly() {
        assert_eq!(to_embassy(GUARDIAN_PERIOD), Duration::from_millis(25));
        assert_eq!(to_embassy(WATCHDOG_PERIOD), Duration::from_millis(100));
        assert_eq!(to_embassy(FORWARD_HOLD), Duration::from_millis(1_050));
    }
}
