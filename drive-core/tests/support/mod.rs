//! Mock hardware shared by the integration tests.
//!
//! Every adapter records what it was asked to do so tests can assert on the
//! full history without real registers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use drive_core::actuator::{BridgeDriver, Channel, DirectionSignal};
use drive_core::guardian::{CurrentSense, FaultIndicator};
use drive_core::maneuver::{Maneuver, MotionPrimitives};
use drive_core::mission::HoldTimer;
use drive_core::watchdog::{ButtonInput, RestartHandle};
use drive_core::ActuationError;

pub const PERIOD: u16 = 399;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DriverCall {
    Duty(Channel, u16),
    Direction(Channel, DirectionSignal),
}

/// Bridge driver that mirrors the output registers and logs every write.
#[derive(Debug)]
pub struct RecordingDriver {
    period: u16,
    pub duty: [u16; 2],
    pub direction: [DirectionSignal; 2],
    pub calls: Vec<DriverCall>,
}

impl RecordingDriver {
    pub fn new(period: u16) -> Self {
        Self {
            period,
            duty: [0; 2],
            direction: [DirectionSignal::Off; 2],
            calls: Vec::new(),
        }
    }

    pub fn is_safe(&self) -> bool {
        self.duty == [0, 0] && self.direction == [DirectionSignal::Brake; 2]
    }
}

impl BridgeDriver for RecordingDriver {
    fn period(&self) -> u16 {
        self.period
    }

    fn set_duty(&mut self, channel: Channel, duty: u16) {
        self.duty[channel.index()] = duty;
        self.calls.push(DriverCall::Duty(channel, duty));
    }

    fn set_direction(&mut self, channel: Channel, signal: DirectionSignal) {
        self.direction[channel.index()] = signal;
        self.calls.push(DriverCall::Direction(channel, signal));
    }
}

/// Comparator outputs fed from per-channel queues; an empty queue reads clean.
#[derive(Debug, Default)]
pub struct ScriptedSense {
    samples: [VecDeque<bool>; 2],
    persistent: [bool; 2],
    pub reads: Vec<Channel>,
}

impl ScriptedSense {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(channel: Channel, samples: &[bool]) -> Self {
        let mut sense = Self::new();
        sense.samples[channel.index()].extend(samples.iter().copied());
        sense
    }

    /// Every read of `channel` reports over-threshold.
    pub fn stuck_over(channel: Channel) -> Self {
        let mut sense = Self::new();
        sense.persistent[channel.index()] = true;
        sense
    }
}

impl CurrentSense for ScriptedSense {
    fn over_threshold(&mut self, channel: Channel) -> bool {
        self.reads.push(channel);
        let scripted = self.samples[channel.index()].pop_front().unwrap_or(false);
        scripted || self.persistent[channel.index()]
    }
}

#[derive(Debug, Default)]
pub struct Lamp {
    pub lit: bool,
    pub writes: usize,
}

impl FaultIndicator for Lamp {
    fn set_fault(&mut self, lit: bool) {
        self.lit = lit;
        self.writes += 1;
    }
}

/// Button fed from a queue of samples; an exhausted queue reads released.
#[derive(Debug, Default)]
pub struct ScriptedButton {
    samples: VecDeque<bool>,
}

impl ScriptedButton {
    pub fn new(samples: &[bool]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
        }
    }
}

impl ButtonInput for ScriptedButton {
    fn is_pressed(&mut self) -> bool {
        self.samples.pop_front().unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct RestartCounter {
    pub restarts: usize,
}

impl RestartHandle for RestartCounter {
    fn trigger_full_reset(&mut self) {
        self.restarts += 1;
    }
}

/// Timer that returns immediately and records every requested hold.
#[derive(Debug, Default)]
pub struct RecordingTimer {
    pub holds: Vec<Duration>,
}

impl HoldTimer for RecordingTimer {
    async fn hold(&mut self, duration: Duration) {
        self.holds.push(duration);
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MotionCall {
    Apply(Maneuver),
    Stop,
}

/// Motion surface that records calls instead of touching a bridge.
#[derive(Debug, Default)]
pub struct RecordingMotion {
    pub calls: RefCell<Vec<MotionCall>>,
}

impl MotionPrimitives for RecordingMotion {
    fn apply(&self, maneuver: Maneuver) -> Result<(), ActuationError> {
        self.calls.borrow_mut().push(MotionCall::Apply(maneuver));
        Ok(())
    }

    fn stop_outputs(&self) -> Result<(), ActuationError> {
        self.calls.borrow_mut().push(MotionCall::Stop);
        Ok(())
    }
}

/// Index of the first sample completing a run of `threshold` consecutive `true`s.
pub fn first_run_completion(samples: &[bool], threshold: usize) -> Option<usize> {
    let mut run = 0;
    for (index, &sample) in samples.iter().enumerate() {
        run = if sample { run + 1 } else { 0 };
        if run >= threshold {
            return Some(index);
        }
    }
    None
}
