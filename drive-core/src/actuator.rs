//! Actuator interface for the dual H-bridge and the latched shared handle
//! every execution context writes through.
//!
//! The bridge registers are the only mutable resource shared between the
//! foreground mission and the periodic samplers. [`SharedBridge`] keeps the
//! driver and the overcurrent latch behind one critical section so a trip can
//! never interleave with, or be undone by, a foreground write.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;

/// One side of the differential drive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Both channels in sampling order.
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// Deterministic index for per-channel arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }

    /// The opposite channel.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Channel::A => Channel::B,
            Channel::B => Channel::A,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => f.write_str("A"),
            Channel::B => f.write_str("B"),
        }
    }
}

/// Direction input state for one half of the bridge.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DirectionSignal {
    Forward,
    Reverse,
    /// Both inputs low; the motor coasts.
    Off,
    /// Both inputs high; the motor windings are shorted.
    Brake,
}

impl DirectionSignal {
    /// Logic levels for the `(IN1, IN2)` pair of the channel.
    #[must_use]
    pub const fn inputs(self) -> (bool, bool) {
        match self {
            DirectionSignal::Forward => (false, true),
            DirectionSignal::Reverse => (true, false),
            DirectionSignal::Off => (false, false),
            DirectionSignal::Brake => (true, true),
        }
    }
}

/// Abstraction over the physical PWM and direction outputs.
pub trait BridgeDriver {
    /// PWM period in timer counts; the largest duty the hardware accepts.
    fn period(&self) -> u16;

    /// Writes the enable duty for a channel. Callers clamp beforehand.
    fn set_duty(&mut self, channel: Channel, duty: u16);

    /// Drives the direction inputs for a channel.
    fn set_direction(&mut self, channel: Channel, signal: DirectionSignal);

    /// Forces zero duty and braking inputs on both channels.
    fn hard_shutdown(&mut self) {
        for channel in Channel::ALL {
            self.set_duty(channel, 0);
            self.set_direction(channel, DirectionSignal::Brake);
        }
    }
}

/// Complete actuation request for both channels.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BridgeCommand {
    pub duty: [u16; 2],
    pub direction: [DirectionSignal; 2],
}

impl BridgeCommand {
    /// Command with zero duty and the same direction on both channels.
    #[must_use]
    pub const fn idle(direction: DirectionSignal) -> Self {
        Self {
            duty: [0; 2],
            direction: [direction; 2],
        }
    }

    /// Returns a copy with both duties limited to `period`.
    #[must_use]
    pub fn clamped(self, period: u16) -> Self {
        Self {
            duty: self.duty.map(|duty| duty.min(period)),
            direction: self.direction,
        }
    }

    /// Duty requested for a channel.
    #[must_use]
    pub const fn duty_for(self, channel: Channel) -> u16 {
        self.duty[channel.index()]
    }

    /// Direction requested for a channel.
    #[must_use]
    pub const fn direction_for(self, channel: Channel) -> DirectionSignal {
        self.direction[channel.index()]
    }
}

/// Reason an actuator write was refused.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActuationError {
    /// The overcurrent latch is set; only a full restart clears it.
    Latched,
}

impl fmt::Display for ActuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuationError::Latched => f.write_str("outputs latched off after overcurrent trip"),
        }
    }
}

struct BridgeCell<D> {
    driver: D,
    tripped: bool,
}

/// Bridge driver plus overcurrent latch shared by every execution context.
pub struct SharedBridge<D> {
    inner: Mutex<RefCell<BridgeCell<D>>>,
}

impl<D: BridgeDriver> SharedBridge<D> {
    /// Wraps a driver with the latch released.
    #[must_use]
    pub const fn new(driver: D) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(BridgeCell {
                driver,
                tripped: false,
            })),
        }
    }

    /// Applies a command to both channels, duty first, then direction.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError::Latched`] once the bridge has tripped; the
    /// driver is not touched.
    pub fn write(&self, command: BridgeCommand) -> Result<(), ActuationError> {
        self.with_armed(|driver| {
            let command = command.clamped(driver.period());
            for channel in Channel::ALL {
                driver.set_duty(channel, command.duty_for(channel));
                driver.set_direction(channel, command.direction_for(channel));
            }
        })
    }

    /// Writes zero duty on both channels, leaving the direction inputs alone.
    ///
    /// # Errors
    ///
    /// Returns [`ActuationError::Latched`] once the bridge has tripped.
    pub fn zero_duties(&self) -> Result<(), ActuationError> {
        self.with_armed(|driver| {
            for channel in Channel::ALL {
                driver.set_duty(channel, 0);
            }
        })
    }

    /// Sets the latch and forces the shutdown state.
    ///
    /// Returns `true` only for the call that set the latch.
    #[must_use]
    pub fn trip(&self) -> bool {
        critical_section::with(|cs| {
            let mut cell = self.inner.borrow_ref_mut(cs);
            let first = !cell.tripped;
            cell.tripped = true;
            cell.driver.hard_shutdown();
            first
        })
    }

    /// Whether the overcurrent latch is set.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).tripped)
    }

    /// Runs `f` with shared access to the driver inside the critical section.
    // Callers mostly pass assertion closures returning `()`.
    #[allow(clippy::must_use_candidate)]
    pub fn with_driver<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs).driver))
    }

    fn with_armed(&self, f: impl FnOnce(&mut D)) -> Result<(), ActuationError> {
        critical_section::with(|cs| {
            let mut cell = self.inner.borrow_ref_mut(cs);
            if cell.tripped {
                return Err(ActuationError::Latched);
            }
            f(&mut cell.driver);
            Ok(())
        })
    }
}
