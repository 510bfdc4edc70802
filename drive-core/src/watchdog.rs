//! Press-and-hold reset watchdog.
//!
//! Polled at its own period, independent of the guardian. Consecutive pressed
//! samples accumulate; any released sample clears the count. Reaching the
//! hold threshold requests a full restart, which discards the whole run.

/// Reset button as seen by the watchdog.
pub trait ButtonInput {
    /// `true` while the button is held. Adapters resolve pin polarity.
    fn is_pressed(&mut self) -> bool;
}

/// Unconditional restart of the whole system.
pub trait RestartHandle {
    /// Restarts from initialization. On hardware this does not return.
    fn trigger_full_reset(&mut self);
}

/// Whether the button stays live after an overcurrent trip.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ResetPolicy {
    /// The hold-to-reset button is the recovery path after a trip.
    #[default]
    AlwaysArmed,
    /// Once tripped, the system stays latched until power is cycled.
    DisarmedAfterTrip,
}

/// Result of one watchdog tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HoldTick {
    Released,
    /// Pressed, with the number of consecutive pressed samples so far.
    Holding(u8),
    /// Pressed, but the policy ignores the button after a trip.
    Disarmed,
    ResetRequested,
}

/// Hold counter plus its threshold and policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResetWatchdog {
    held: u8,
    hold_ticks: u8,
    policy: ResetPolicy,
}

impl ResetWatchdog {
    /// A `hold_ticks` of zero is treated as one.
    #[must_use]
    pub const fn new(hold_ticks: u8, policy: ResetPolicy) -> Self {
        Self {
            held: 0,
            hold_ticks: if hold_ticks == 0 { 1 } else { hold_ticks },
            policy,
        }
    }

    /// Consecutive pressed samples observed so far.
    #[must_use]
    pub const fn held(&self) -> u8 {
        self.held
    }

    #[must_use]
    pub const fn hold_ticks(&self) -> u8 {
        self.hold_ticks
    }

    #[must_use]
    pub const fn policy(&self) -> ResetPolicy {
        self.policy
    }

    /// Advances the hold counter with one button sample.
    ///
    /// Every pressed sample at or past the threshold requests a restart; the
    /// counter saturates at the threshold.
    pub fn observe(&mut self, pressed: bool, tripped: bool) -> HoldTick {
        if !pressed {
            self.held = 0;
            return HoldTick::Released;
        }

        if tripped && self.policy == ResetPolicy::DisarmedAfterTrip {
            self.held = 0;
            return HoldTick::Disarmed;
        }

        self.held = self.held.saturating_add(1).min(self.hold_ticks);
        if self.held >= self.hold_ticks {
            HoldTick::ResetRequested
        } else {
            HoldTick::Holding(self.held)
        }
    }

    /// Samples the button and restarts the system once the hold completes.
    pub fn tick<B, R>(&mut self, button: &mut B, restart: &mut R, tripped: bool) -> HoldTick
    where
        B: ButtonInput + ?Sized,
        R: RestartHandle + ?Sized,
    {
        let outcome = self.observe(button.is_pressed(), tripped);
        if outcome == HoldTick::ResetRequested {
            restart.trigger_full_reset();
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_clears_the_count() {
        let mut watchdog = ResetWatchdog::new(10, ResetPolicy::AlwaysArmed);
        for expected in 1..=9 {
            assert_eq!(watchdog.observe(true, false), HoldTick::Holding(expected));
        }
        assert_eq!(watchdog.observe(false, false), HoldTick::Released);
        assert_eq!(watchdog.held(), 0);
        assert_eq!(watchdog.observe(true, false), HoldTick::Holding(1));
    }

    #[test]
    fn counter_saturates_at_threshold() {
        let mut watchdog = ResetWatchdog::new(3, ResetPolicy::AlwaysArmed);
        watchdog.observe(true, false);
        watchdog.observe(true, false);
        assert_eq!(watchdog.observe(true, false), HoldTick::ResetRequested);
        assert_eq!(watchdog.observe(true, false), HoldTick::ResetRequested);
        assert_eq!(watchdog.held(), 3);
    }

    #[test]
    fn always_armed_resets_after_trip() {
        let mut watchdog = ResetWatchdog::new(1, ResetPolicy::AlwaysArmed);
        assert_eq!(watchdog.observe(true, true), HoldTick::ResetRequested);
    }

    #[test]
    fn disarmed_policy_ignores_button_after_trip() {
        let mut watchdog = ResetWatchdog::new(2, ResetPolicy::DisarmedAfterTrip);
        assert_eq!(watchdog.observe(true, false), HoldTick::Holding(1));
        assert_eq!(watchdog.observe(true, true), HoldTick::Disarmed);
        assert_eq!(watchdog.held(), 0);
        assert_eq!(watchdog.observe(true, true), HoldTick::Disarmed);
    }
}
