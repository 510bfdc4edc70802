//! Overcurrent guardian.
//!
//! A periodic sampler that reads one current-sense channel per tick, strictly
//! alternating A, B, A, ... Each channel keeps its own debounce counter: an
//! over-threshold sample increments it, a clean sample clears it. When a
//! counter reaches the configured threshold the guardian latches the shared
//! bridge into its shutdown state, lights the fault indicator, and never
//! samples again for the rest of the run.
//!
//! A clean sample resets the counter outright rather than decaying it, so a
//! fault must be observed on N consecutive samples of the same channel.

use crate::actuator::{BridgeDriver, Channel, SharedBridge};

/// Reads the current-sense comparator for a channel.
pub trait CurrentSense {
    /// `true` when the channel's motor current is above the trip threshold.
    fn over_threshold(&mut self, channel: Channel) -> bool;
}

/// Persistent fault lamp.
pub trait FaultIndicator {
    fn set_fault(&mut self, lit: bool);
}

/// Sampling phase of the guardian.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GuardianState {
    /// The next tick samples this channel.
    Sampling(Channel),
    /// Terminal; records the channel that latched the fault.
    Tripped(Channel),
}

/// Result of a single guardian tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GuardianTick {
    /// The channel read below threshold; its counter is back at zero.
    Clean(Channel),
    /// Over threshold but not yet persistent.
    Suspect { channel: Channel, count: u8 },
    /// This tick latched the fault.
    Tripped(Channel),
    /// Already tripped; nothing was sampled.
    Halted,
}

/// Debounced overcurrent state machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OvercurrentGuardian {
    state: GuardianState,
    counts: [u8; 2],
    debounce_ticks: u8,
}

impl OvercurrentGuardian {
    /// Creates a guardian that samples channel A first.
    ///
    /// A `debounce_ticks` of zero is treated as one; a single over-threshold
    /// sample then trips immediately.
    #[must_use]
    pub const fn new(debounce_ticks: u8) -> Self {
        Self {
            state: GuardianState::Sampling(Channel::A),
            counts: [0; 2],
            debounce_ticks: if debounce_ticks == 0 { 1 } else { debounce_ticks },
        }
    }

    #[must_use]
    pub const fn state(&self) -> GuardianState {
        self.state
    }

    #[must_use]
    pub const fn is_tripped(&self) -> bool {
        matches!(self.state, GuardianState::Tripped(_))
    }

    /// Channel the next tick will read, or `None` once tripped.
    #[must_use]
    pub const fn next_channel(&self) -> Option<Channel> {
        match self.state {
            GuardianState::Sampling(channel) => Some(channel),
            GuardianState::Tripped(_) => None,
        }
    }

    /// Current debounce counter for a channel.
    #[must_use]
    pub const fn count(&self, channel: Channel) -> u8 {
        self.counts[channel.index()]
    }

    #[must_use]
    pub const fn debounce_ticks(&self) -> u8 {
        self.debounce_ticks
    }

    /// Advances the state machine with a sample for the channel due this tick.
    ///
    /// Performs no I/O; [`Self::tick`] wraps this with the sensing and
    /// shutdown side effects.
    pub fn observe(&mut self, over_threshold: bool) -> GuardianTick {
        let GuardianState::Sampling(channel) = self.state else {
            return GuardianTick::Halted;
        };

        let slot = &mut self.counts[channel.index()];
        let outcome = if over_threshold {
            *slot = slot.saturating_add(1).min(self.debounce_ticks);
            if *slot >= self.debounce_ticks {
                self.state = GuardianState::Tripped(channel);
                return GuardianTick::Tripped(channel);
            }
            GuardianTick::Suspect {
                channel,
                count: *slot,
            }
        } else {
            *slot = 0;
            GuardianTick::Clean(channel)
        };

        self.state = GuardianState::Sampling(channel.other());
        outcome
    }

    /// Runs one periodic tick against the hardware interfaces.
    ///
    /// On the tripping sample the bridge latch is set before the indicator
    /// is lit, so outputs are safe before anything else happens.
    pub fn tick<S, D, I>(
        &mut self,
        sense: &mut S,
        bridge: &SharedBridge<D>,
        indicator: &mut I,
    ) -> GuardianTick
    where
        S: CurrentSense + ?Sized,
        D: BridgeDriver,
        I: FaultIndicator + ?Sized,
    {
        let Some(channel) = self.next_channel() else {
            return GuardianTick::Halted;
        };

        let outcome = self.observe(sense.over_threshold(channel));
        if let GuardianTick::Tripped(_) = outcome {
            let _ = bridge.trip();
            indicator.set_fault(true);
        }
        outcome
    }
}
