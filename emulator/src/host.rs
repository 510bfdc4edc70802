//! Host stand-ins for the bridge, sensors, button, LED, and restart line.
//!
//! Inputs are scripted against the time since the current boot started so a
//! scenario replays the same way on every run.

use std::future::poll_fn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Poll;
use std::thread;
use std::time::{Duration, Instant};

use drive_core::{
    BridgeDriver, ButtonInput, Channel, CurrentSense, DirectionSignal, FaultIndicator, HoldTimer,
    RestartHandle,
};

use crate::session::{Transcript, TranscriptRole};

/// Longest single sleep while a host future is pending.
const POLL_SLICE: Duration = Duration::from_millis(1);

/// Bridge registers that echo every change into the transcript.
pub struct HostBridge {
    transcript: Arc<Transcript>,
    period: u16,
    duty: [u16; 2],
    direction: [DirectionSignal; 2],
}

impl HostBridge {
    pub fn new(transcript: Arc<Transcript>, period: u16) -> Self {
        Self {
            transcript,
            period,
            duty: [0; 2],
            direction: [DirectionSignal::Off; 2],
        }
    }
}

impl BridgeDriver for HostBridge {
    fn period(&self) -> u16 {
        self.period
    }

    fn set_duty(&mut self, channel: Channel, duty: u16) {
        let slot = &mut self.duty[channel.index()];
        if *slot != duty {
            *slot = duty;
            self.transcript.line(
                TranscriptRole::Bridge,
                &format!("channel {channel} duty {duty}/{}", self.period),
            );
        }
    }

    fn set_direction(&mut self, channel: Channel, signal: DirectionSignal) {
        let slot = &mut self.direction[channel.index()];
        if *slot != signal {
            *slot = signal;
            self.transcript.line(
                TranscriptRole::Bridge,
                &format!("channel {channel} direction {signal:?}"),
            );
        }
    }

    fn hard_shutdown(&mut self) {
        self.transcript
            .fault(TranscriptRole::Bridge, "hard shutdown: zero duty, brake");
        for channel in Channel::ALL {
            self.set_duty(channel, 0);
            self.set_direction(channel, DirectionSignal::Brake);
        }
    }
}

/// A stuck-high sense line on one channel from `after` onwards.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FaultInjection {
    pub channel: Channel,
    pub after: Duration,
}

/// The reset button held down during `[after, after + hold)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonPress {
    pub after: Duration,
    pub hold: Duration,
}

impl ButtonPress {
    pub fn is_down(&self, elapsed: Duration) -> bool {
        elapsed >= self.after && elapsed < self.after + self.hold
    }
}

pub struct InjectedSense {
    started: Instant,
    fault: Option<FaultInjection>,
}

impl InjectedSense {
    pub fn new(started: Instant, fault: Option<FaultInjection>) -> Self {
        Self { started, fault }
    }
}

impl CurrentSense for InjectedSense {
    fn over_threshold(&mut self, channel: Channel) -> bool {
        self.fault.is_some_and(|fault| {
            fault.channel == channel && self.started.elapsed() >= fault.after
        })
    }
}

pub struct ScriptedButton {
    started: Instant,
    press: Option<ButtonPress>,
}

impl ScriptedButton {
    pub fn new(started: Instant, press: Option<ButtonPress>) -> Self {
        Self { started, press }
    }
}

impl ButtonInput for ScriptedButton {
    fn is_pressed(&mut self) -> bool {
        let elapsed = self.started.elapsed();
        self.press.is_some_and(|press| press.is_down(elapsed))
    }
}

pub struct HostLamp {
    transcript: Arc<Transcript>,
    lit: bool,
}

impl HostLamp {
    pub fn new(transcript: Arc<Transcript>) -> Self {
        Self {
            transcript,
            lit: false,
        }
    }
}

impl FaultIndicator for HostLamp {
    fn set_fault(&mut self, lit: bool) {
        if self.lit != lit {
            self.lit = lit;
            let state = if lit { "on" } else { "off" };
            self.transcript
                .fault(TranscriptRole::Guardian, &format!("fault LED {state}"));
        }
    }
}

/// Raises a flag the boot loop polls; the boot is torn down and restarted.
pub struct HostRestart<'a> {
    requested: &'a AtomicBool,
}

impl<'a> HostRestart<'a> {
    pub fn new(requested: &'a AtomicBool) -> Self {
        Self { requested }
    }
}

impl RestartHandle for HostRestart<'_> {
    fn trigger_full_reset(&mut self) {
        self.requested.store(true, Ordering::Release);
    }
}

/// Resolves once the watchdog has requested a restart.
pub async fn restart_requested(requested: &AtomicBool) {
    poll_fn(|_| {
        if requested.load(Ordering::Acquire) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    })
    .await;
}

/// Wall-clock hold timer for `embassy_futures::block_on`.
///
/// `block_on` re-polls without waiting on a waker, so a pending poll sleeps
/// for a short slice instead of spinning.
pub struct HostTimer;

impl HoldTimer for HostTimer {
    async fn hold(&mut self, duration: Duration) {
        let until = Instant::now() + duration;
        poll_fn(|_| {
            let now = Instant::now();
            if now >= until {
                Poll::Ready(())
            } else {
                thread::sleep((until - now).min(POLL_SLICE));
                Poll::Pending
            }
        })
        .await;
    }
}

/// Sleeps until `deadline`, returning immediately if it already passed.
pub fn sleep_until(deadline: Instant) {
    thread::sleep(deadline.saturating_duration_since(Instant::now()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_window_is_half_open() {
        let press = ButtonPress {
            after: Duration::from_millis(500),
            hold: Duration::from_millis(1_500),
        };
        assert!(!press.is_down(Duration::from_millis(499)));
        assert!(press.is_down(Duration::from_millis(500)));
        assert!(press.is_down(Duration::from_millis(1_999)));
        assert!(!press.is_down(Duration::from_millis(2_000)));
    }

    #[test]
    fn injected_fault_only_hits_its_channel() {
        let fault = FaultInjection {
            channel: Channel::B,
            after: Duration::ZERO,
        };
        let mut sense = InjectedSense::new(Instant::now(), Some(fault));
        assert!(!sense.over_threshold(Channel::A));
        assert!(sense.over_threshold(Channel::B));
    }

    #[test]
    fn host_timer_waits_at_least_the_hold() {
        let started = Instant::now();
        embassy_futures::block_on(HostTimer.hold(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
