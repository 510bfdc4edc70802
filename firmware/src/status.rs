#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! The guardian and watchdog run from interrupt executors; they publish what
//! they saw into these atomics so the foreground can log a
//! [`StatusSnapshot`] without reaching into their state.

use drive_core::Channel;
use portable_atomic::{AtomicU8, AtomicU32, Ordering};

const NO_TRIP: u8 = 0;

/// Channel that latched the fault (0 == none, otherwise index + 1).
static TRIPPED_CHANNEL: AtomicU8 = AtomicU8::new(NO_TRIP);
/// Guardian ticks that sampled a channel.
static GUARDIAN_SAMPLES: AtomicU32 = AtomicU32::new(0);
/// Consecutive pressed samples last reported by the watchdog.
static HOLD_TICKS: AtomicU8 = AtomicU8::new(0);

#[allow(clippy::cast_possible_truncation)]
fn encode_channel(channel: Channel) -> u8 {
    channel.index() as u8 + 1
}

fn decode_channel(raw: u8) -> Option<Channel> {
    Channel::ALL
        .into_iter()
        .find(|channel| encode_channel(*channel) == raw)
}

/// Records which channel latched the overcurrent fault.
///
/// Only the first trip is kept; later calls are ignored.
pub fn record_trip(channel: Channel) {
    let _ = TRIPPED_CHANNEL.compare_exchange(
        NO_TRIP,
        encode_channel(channel),
        Ordering::AcqRel,
        Ordering::Acquire,
    );
}

pub fn tripped_channel() -> Option<Channel> {
    decode_channel(TRIPPED_CHANNEL.load(Ordering::Acquire))
}

/// Counts one guardian sample.
pub fn record_guardian_sample() {
    GUARDIAN_SAMPLES.fetch_add(1, Ordering::Relaxed);
}

/// Stores the watchdog's current hold count.
pub fn record_hold(held: u8) {
    HOLD_TICKS.store(held, Ordering::Relaxed);
}

/// Point-in-time copy of the shared counters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub tripped: Option<Channel>,
    pub guardian_samples: u32,
    pub hold_ticks: u8,
}

pub fn snapshot() -> StatusSnapshot {
    StatusSnapshot {
        tripped: tripped_channel(),
        guardian_samples: GUARDIAN_SAMPLES.load(Ordering::Relaxed),
        hold_ticks: HOLD_TICKS.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_encoding_skips_the_empty_marker() {
        for channel in Channel::ALL {
            let raw = encode_channel(channel);
            assert_ne!(raw, NO_TRIP);
            assert_eq!(decode_channel(raw), Some(channel));
        }
        assert_eq!(decode_channel(NO_TRIP), None);
    }

    // The statics are process-wide, so everything that touches them lives in
    // one test.
    #[test]
    fn first_trip_wins_and_counters_accumulate() {
        assert_eq!(tripped_channel(), None);

        record_trip(Channel::B);
        record_trip(Channel::A);
        assert_eq!(tripped_channel(), Some(Channel::B));

        record_guardian_sample();
        record_guardian_sample();
        record_hold(7);

        let status = snapshot();
        assert_eq!(status.tripped, Some(Channel::B));
        assert_eq!(status.guardian_samples, 2);
        assert_eq!(status.hold_ticks, 7);
    }
}
