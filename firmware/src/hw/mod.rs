//! STM32G0 adapters for the `drive-core` hardware traits.
//!
//! Pin map:
//! - TIM3 CH1 (PA6) / CH2 (PA7): enable PWM for channels A and B
//! - PB3/PB4: channel A direction inputs, PB5/PB6: channel B
//! - PA0/PA1: current-sense amplifier outputs for A and B
//! - PC13: reset button, active low
//! - PA5: fault LED

use cortex_m::peripheral::SCB;
use defmt::warn;
use drive_core::config::PWM_PERIOD;
use drive_core::{
    BridgeDriver, ButtonInput, Channel, CurrentSense, DirectionSignal, FaultIndicator,
    RestartHandle,
};
use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
use embassy_stm32::gpio::{Input, Level, Output};
use embassy_stm32::peripherals::{ADC1, TIM3};
use embassy_stm32::timer::simple_pwm::SimplePwm;

/// Raw ADC counts that stand in for the comparator reference (~0.45 V of a
/// 3.3 V, 12-bit range).
pub const SENSE_TRIP_COUNTS: u16 = 558;

/// Dual H-bridge driven by two PWM channels and four direction GPIOs.
///
/// Duty is expressed in the logical `PWM_PERIOD` counts used by the control
/// core and rescaled onto the timer's real auto-reload value.
pub struct HBridge<'d> {
    pwm: SimplePwm<'d, TIM3>,
    max_duty: u16,
    direction_a: [Output<'d>; 2],
    direction_b: [Output<'d>; 2],
}

impl<'d> HBridge<'d> {
    /// Takes ownership of the outputs and parks both channels at zero duty.
    pub fn new(
        mut pwm: SimplePwm<'d, TIM3>,
        direction_a: [Output<'d>; 2],
        direction_b: [Output<'d>; 2],
    ) -> Self {
        let max_duty = pwm.max_duty_cycle();
        pwm.ch1().set_duty_cycle(0);
        pwm.ch2().set_duty_cycle(0);
        pwm.ch1().enable();
        pwm.ch2().enable();

        Self {
            pwm,
            max_duty,
            direction_a,
            direction_b,
        }
    }

    fn scaled(&self, duty: u16) -> u16 {
        let counts = u32::from(duty.min(PWM_PERIOD)) * u32::from(self.max_duty)
            / u32::from(PWM_PERIOD);
        u16::try_from(counts).unwrap_or(self.max_duty)
    }
}

impl BridgeDriver for HBridge<'_> {
    fn period(&self) -> u16 {
        PWM_PERIOD
    }

    fn set_duty(&mut self, channel: Channel, duty: u16) {
        let counts = self.scaled(duty);
        match channel {
            Channel::A => self.pwm.ch1().set_duty_cycle(counts),
            Channel::B => self.pwm.ch2().set_duty_cycle(counts),
        }
    }

    fn set_direction(&mut self, channel: Channel, signal: DirectionSignal) {
        let (in1, in2) = signal.inputs();
        let pins = match channel {
            Channel::A => &mut self.direction_a,
            Channel::B => &mut self.direction_b,
        };
        pins[0].set_level(Level::from(in1));
        pins[1].set_level(Level::from(in2));
    }
}

/// Samples the per-channel sense amplifiers and compares against a fixed
/// threshold.
pub struct SenseAdc<'d> {
    adc: Adc<'d, ADC1>,
    inputs: [AnyAdcChannel<ADC1>; 2],
    threshold: u16,
}

impl<'d> SenseAdc<'d> {
    pub fn new(mut adc: Adc<'d, ADC1>, inputs: [AnyAdcChannel<ADC1>; 2], threshold: u16) -> Self {
        adc.set_sample_time(SampleTime::CYCLES160_5);
        Self {
            adc,
            inputs,
            threshold,
        }
    }
}

impl CurrentSense for SenseAdc<'_> {
    fn over_threshold(&mut self, channel: Channel) -> bool {
        let reading = self.adc.blocking_read(&mut self.inputs[channel.index()]);
        reading > self.threshold
    }
}

/// Push button wired to ground with the internal pull-up enabled.
pub struct ResetButton<'d> {
    pin: Input<'d>,
}

impl<'d> ResetButton<'d> {
    pub fn new(pin: Input<'d>) -> Self {
        Self { pin }
    }
}

impl ButtonInput for ResetButton<'_> {
    fn is_pressed(&mut self) -> bool {
        self.pin.is_low()
    }
}

pub struct FaultLed<'d> {
    pin: Output<'d>,
}

impl<'d> FaultLed<'d> {
    /// Starts with the LED off.
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_low();
        Self { pin }
    }
}

impl FaultIndicator for FaultLed<'_> {
    fn set_fault(&mut self, lit: bool) {
        self.pin.set_level(Level::from(lit));
    }
}

/// Restarts the MCU through the system control block.
pub struct SystemReset;

impl RestartHandle for SystemReset {
    fn trigger_full_reset(&mut self) {
        warn!("reset button held; restarting");
        SCB::sys_reset();
    }
}
