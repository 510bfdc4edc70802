use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt::info;
use defmt_rtt as _;
use drive_core::{Channel, DriveConfig, SharedBridge};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::time::khz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use static_cell::StaticCell;

use crate::hw::{FaultLed, HBridge, ResetButton, SENSE_TRIP_COUNTS, SenseAdc, SystemReset};

mod guardian_task;
mod mission_task;
mod watchdog_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Bridge handle shared by every execution context.
pub(super) type Bridge = SharedBridge<HBridge<'static>>;

/// Events reported to the foreground by the periodic samplers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum DriveEvent {
    Tripped(Channel),
}

pub(super) static EVENTS: Signal<CriticalSectionRawMutex, DriveEvent> = Signal::new();

static BRIDGE: StaticCell<Bridge> = StaticCell::new();

/// Runs the overcurrent guardian above everything else.
static GUARDIAN_EXECUTOR: InterruptExecutor = InterruptExecutor::new();
/// Runs the reset watchdog above the foreground, below the guardian.
static WATCHDOG_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[hal::interrupt]
unsafe fn USART3_4_5_6_LPUART1() {
    unsafe { GUARDIAN_EXECUTOR.on_interrupt() }
}

#[hal::interrupt]
unsafe fn CEC() {
    unsafe { WATCHDOG_EXECUTOR.on_interrupt() }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = DriveConfig::default();
    config.validate().expect("invalid drive configuration");

    let hal::Peripherals {
        TIM3,
        ADC1,
        PA0,
        PA1,
        PA5,
        PA6,
        PA7,
        PB3,
        PB4,
        PB5,
        PB6,
        PC13,
        ..
    } = hal::init(hal::Config::default());

    // Direction pins start low so both channels coast until the first write.
    let direction_a = [
        Output::new(PB3, Level::Low, Speed::Low),
        Output::new(PB4, Level::Low, Speed::Low),
    ];
    let direction_b = [
        Output::new(PB5, Level::Low, Speed::Low),
        Output::new(PB6, Level::Low, Speed::Low),
    ];
    let pwm = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PA6, OutputType::PushPull)),
        Some(PwmPin::new(PA7, OutputType::PushPull)),
        None,
        None,
        khz(20),
        CountingMode::EdgeAlignedUp,
    );
    let bridge: &'static Bridge =
        BRIDGE.init(SharedBridge::new(HBridge::new(pwm, direction_a, direction_b)));

    let sense = SenseAdc::new(
        Adc::new(ADC1),
        [PA0.degrade_adc(), PA1.degrade_adc()],
        SENSE_TRIP_COUNTS,
    );
    let led = FaultLed::new(Output::new(PA5, Level::Low, Speed::Low));
    let button = ResetButton::new(Input::new(PC13, Pull::Up));

    info!(
        "drive base up: guardian {} ms x{}, watchdog {} ms x{}",
        config.guardian_period.as_millis(),
        config.debounce_ticks,
        config.watchdog_period.as_millis(),
        config.hold_ticks,
    );

    hal::interrupt::USART3_4_5_6_LPUART1.set_priority(Priority::P1);
    let guardian_spawner = GUARDIAN_EXECUTOR.start(hal::interrupt::USART3_4_5_6_LPUART1);
    guardian_spawner
        .spawn(guardian_task::run(bridge, sense, led, config))
        .expect("failed to spawn guardian task");

    hal::interrupt::CEC.set_priority(Priority::P2);
    let watchdog_spawner = WATCHDOG_EXECUTOR.start(hal::interrupt::CEC);
    watchdog_spawner
        .spawn(watchdog_task::run(bridge, button, SystemReset, config))
        .expect("failed to spawn watchdog task");

    spawner
        .spawn(mission_task::run(bridge))
        .expect("failed to spawn mission task");

    core::future::pending::<()>().await;
}
