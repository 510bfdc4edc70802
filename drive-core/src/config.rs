//! Build-time tunables for the drive base.
//!
//! The PWM numbers come from the timer setup the bridge was characterized
//! with: an 8 MHz timer clock counting up to `CCR0` for a 20 kHz carrier.

use core::fmt;
use core::time::Duration;

use crate::watchdog::ResetPolicy;

/// Timer clock feeding the PWM generator.
pub const PWM_CLOCK_HZ: u32 = 8_000_000;
/// PWM carrier frequency.
pub const PWM_FREQUENCY_HZ: u32 = 20_000;
/// Counts per PWM period (`CCR0`), the largest valid duty.
#[allow(clippy::cast_possible_truncation)]
pub const PWM_PERIOD: u16 = (PWM_CLOCK_HZ / PWM_FREQUENCY_HZ - 1) as u16;

/// Interval between current-sense samples (one channel per tick).
pub const GUARDIAN_PERIOD: Duration = Duration::from_millis(25);
/// Consecutive over-threshold samples on one channel that latch a fault.
pub const OVERCURRENT_DEBOUNCE_TICKS: u8 = 4;

/// Interval between reset button samples.
pub const WATCHDOG_PERIOD: Duration = Duration::from_millis(100);
/// Consecutive pressed samples that request a full restart (~1 s).
pub const RESET_HOLD_TICKS: u8 = 10;

/// Runtime view of the tunables, validated once at boot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DriveConfig {
    pub pwm_period: u16,
    pub guardian_period: Duration,
    pub debounce_ticks: u8,
    pub watchdog_period: Duration,
    pub hold_ticks: u8,
    pub reset_policy: ResetPolicy,
}

impl DriveConfig {
    pub const DEFAULT: Self = Self {
        pwm_period: PWM_PERIOD,
        guardian_period: GUARDIAN_PERIOD,
        debounce_ticks: OVERCURRENT_DEBOUNCE_TICKS,
        watchdog_period: WATCHDOG_PERIOD,
        hold_ticks: RESET_HOLD_TICKS,
        reset_policy: ResetPolicy::AlwaysArmed,
    };

    /// Rejects values that would disable protection or stall a sampler.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, checking the PWM period,
    /// then the thresholds, then the tick periods.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pwm_period == 0 {
            return Err(ConfigError::ZeroPwmPeriod);
        }
        if self.debounce_ticks == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.hold_ticks == 0 {
            return Err(ConfigError::ZeroHoldThreshold);
        }
        if self.guardian_period.is_zero() || self.watchdog_period.is_zero() {
            return Err(ConfigError::ZeroTickPeriod);
        }
        Ok(())
    }

    /// Longest time a persistent single-channel fault can go unlatched.
    ///
    /// Channels are polled in alternation, so N debounce ticks on one channel
    /// span up to 2N guardian periods. Saturates at [`Duration::MAX`].
    #[must_use]
    pub fn worst_case_trip_latency(&self) -> Duration {
        self.guardian_period
            .saturating_mul(u32::from(self.debounce_ticks))
            .saturating_mul(2)
    }

    /// Button hold time needed to request a restart, saturating like
    /// [`DriveConfig::worst_case_trip_latency`].
    #[must_use]
    pub fn reset_hold_time(&self) -> Duration {
        self.watchdog_period
            .saturating_mul(u32::from(self.hold_ticks))
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reason a [`DriveConfig`] was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    ZeroPwmPeriod,
    ZeroDebounce,
    ZeroHoldThreshold,
    ZeroTickPeriod,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ConfigError::ZeroPwmPeriod => "PWM period must be non-zero",
            ConfigError::ZeroDebounce => "overcurrent debounce must be at least one tick",
            ConfigError::ZeroHoldThreshold => "reset hold threshold must be at least one tick",
            ConfigError::ZeroTickPeriod => "sampler tick periods must be non-zero",
        };
        f.write_str(reason)
    }
}
