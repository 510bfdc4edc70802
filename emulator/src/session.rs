use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::style::Stylize;
use drive_core::mission::DRIVE_THEN_PIVOT;
use drive_core::{
    Channel, DriveConfig, GuardianTick, HoldTick, HoldTimer, MissionReport, OvercurrentGuardian,
    ResetWatchdog, SharedBridge,
};
use embassy_futures::block_on;
use embassy_futures::select::{Either, select};

use crate::host::{
    ButtonPress, FaultInjection, HostBridge, HostLamp, HostRestart, HostTimer, InjectedSense,
    ScriptedButton, restart_requested, sleep_until,
};

/// How long the foreground idles after the mission before a boot is closed.
const IDLE_AFTER_MISSION: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScenarioProfile {
    Clean,
    OvercurrentA,
    OvercurrentB,
    Reset,
    TripThenReset,
}

impl ScenarioProfile {
    pub const ALL: [ScenarioProfile; 5] = [
        ScenarioProfile::Clean,
        ScenarioProfile::OvercurrentA,
        ScenarioProfile::OvercurrentB,
        ScenarioProfile::Reset,
        ScenarioProfile::TripThenReset,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ScenarioProfile::Clean => "clean",
            ScenarioProfile::OvercurrentA => "overcurrent-a",
            ScenarioProfile::OvercurrentB => "overcurrent-b",
            ScenarioProfile::Reset => "reset",
            ScenarioProfile::TripThenReset => "trip-reset",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            ScenarioProfile::Clean => "Drive emulator: uninterrupted mission",
            ScenarioProfile::OvercurrentA => "Drive emulator: channel A overcurrent",
            ScenarioProfile::OvercurrentB => "Drive emulator: channel B overcurrent",
            ScenarioProfile::Reset => "Drive emulator: hold-to-reset mid mission",
            ScenarioProfile::TripThenReset => "Drive emulator: reset after overcurrent trip",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("Unknown scenario profile `{tag}`"))
    }

    /// Fault injected during the first boot, if any.
    pub fn fault(self) -> Option<FaultInjection> {
        let channel = match self {
            ScenarioProfile::OvercurrentA | ScenarioProfile::TripThenReset => Channel::A,
            ScenarioProfile::OvercurrentB => Channel::B,
            ScenarioProfile::Clean | ScenarioProfile::Reset => return None,
        };
        Some(FaultInjection {
            channel,
            after: Duration::from_millis(300),
        })
    }

    /// Button press during the first boot, if any.
    pub fn press(self) -> Option<ButtonPress> {
        let after = match self {
            ScenarioProfile::Reset => Duration::from_millis(500),
            ScenarioProfile::TripThenReset => Duration::from_millis(1_000),
            _ => return None,
        };
        Some(ButtonPress {
            after,
            hold: Duration::from_millis(1_500),
        })
    }

    /// Boots the profile needs: one, plus one for every scripted restart.
    pub fn max_boots(self) -> u32 {
        if self.press().is_some() { 2 } else { 1 }
    }

    pub fn log_path(self) -> String {
        format!("transcripts/emulator-{}.log", self.tag())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptRole {
    Boot,
    Mission,
    Bridge,
    Guardian,
    Watchdog,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Boot => "BOOT ",
            TranscriptRole::Mission => "MISN ",
            TranscriptRole::Bridge => "BRDG ",
            TranscriptRole::Guardian => "GRDN ",
            TranscriptRole::Watchdog => "WDOG ",
        }
    }
}

/// Timestamped log shared by every simulated execution context.
///
/// Lines go to an optional file and, when enabled, to stdout with faults
/// highlighted. The first I/O error is kept and surfaced by [`Transcript::finish`].
pub struct Transcript {
    started_at: Instant,
    echo: bool,
    color: bool,
    file: Mutex<Option<BufWriter<File>>>,
    error: Mutex<Option<io::Error>>,
}

impl Transcript {
    pub fn stdout() -> Self {
        Self {
            started_at: Instant::now(),
            echo: true,
            color: io::stdout().is_terminal(),
            file: Mutex::new(None),
            error: Mutex::new(None),
        }
    }

    pub fn to_file(profile: ScenarioProfile, echo: bool) -> io::Result<Self> {
        let path = profile.log_path();
        if let Some(parent) = Path::new(&path).parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "# {}", profile.header())?;
        writeln!(writer, "# Timestamps are milliseconds since session start")?;
        writeln!(writer)?;

        Ok(Self {
            file: Mutex::new(Some(writer)),
            echo,
            ..Self::stdout()
        })
    }

    pub fn line(&self, role: TranscriptRole, message: &str) {
        self.append(role, message, false);
    }

    pub fn fault(&self, role: TranscriptRole, message: &str) {
        self.append(role, message, true);
    }

    fn append(&self, role: TranscriptRole, message: &str, fault: bool) {
        let line = format!(
            "[+{:>6} ms] {}{}",
            self.started_at.elapsed().as_millis(),
            role.prefix(),
            message
        );

        if self.echo {
            if fault && self.color {
                println!("{}", line.as_str().red().bold());
            } else {
                println!("{line}");
            }
        }

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(writer) = file.as_mut() else {
            return;
        };
        if let Err(err) = writeln!(writer, "{line}") {
            self.record_error(err);
        }
    }

    fn record_error(&self, err: io::Error) {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(err);
    }

    /// Flushes the file and returns the first write error, if any.
    pub fn finish(&self) -> io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(writer) = file.as_mut() {
            writer.flush()?;
        }
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// How a single boot ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BootOutcome {
    /// The mission ran to completion (or was preempted) and the idle window
    /// elapsed.
    Settled {
        report: MissionReport,
        tripped: bool,
    },
    /// The watchdog requested a full restart.
    Restarted,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionSummary {
    pub boots: Vec<BootOutcome>,
}

impl SessionSummary {
    pub fn restarts(&self) -> usize {
        self.boots
            .iter()
            .filter(|outcome| **outcome == BootOutcome::Restarted)
            .count()
    }

    pub fn last(&self) -> Option<BootOutcome> {
        self.boots.last().copied()
    }
}

/// One emulator run: boots the drive base until a boot settles or the
/// profile's boot limit is reached.
pub struct Session {
    profile: ScenarioProfile,
    config: DriveConfig,
    transcript: Arc<Transcript>,
}

impl Session {
    pub fn new(profile: ScenarioProfile, transcript: Transcript) -> Result<Self, String> {
        let config = DriveConfig::default();
        config.validate().map_err(|err| err.to_string())?;
        Ok(Self {
            profile,
            config,
            transcript: Arc::new(transcript),
        })
    }

    pub fn run(&self) -> io::Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        for boot in 1..=self.profile.max_boots() {
            let outcome = self.boot(boot);
            summary.boots.push(outcome);
            if outcome != BootOutcome::Restarted {
                break;
            }
        }
        self.transcript.finish()?;
        Ok(summary)
    }

    /// Runs one power-on: the guardian and watchdog on their own threads and
    /// the mission in the foreground. Only the first boot sees injected
    /// faults and button presses.
    fn boot(&self, boot: u32) -> BootOutcome {
        let (fault, press) = if boot == 1 {
            (self.profile.fault(), self.profile.press())
        } else {
            (None, None)
        };

        self.transcript.line(
            TranscriptRole::Boot,
            &format!("boot #{boot}: fault LED off, outputs coasting"),
        );

        let system = BootedSystem::new(&self.transcript, self.config);
        let lamp = HostLamp::new(Arc::clone(&self.transcript));

        let outcome = thread::scope(|scope| {
            scope.spawn(|| system.run_guardian(fault, lamp));
            scope.spawn(|| system.run_watchdog(press));

            let outcome = match block_on(select(
                system.run_mission(),
                restart_requested(&system.restart),
            )) {
                Either::First(report) => BootOutcome::Settled {
                    report,
                    tripped: system.bridge.is_tripped(),
                },
                Either::Second(()) => BootOutcome::Restarted,
            };
            system.stop.store(true, Ordering::Release);
            outcome
        });

        if outcome == BootOutcome::Restarted {
            self.transcript.line(TranscriptRole::Boot, "restarting");
        }
        outcome
    }
}

/// Everything that lives for exactly one boot. Dropping it is the restart.
struct BootedSystem<'a> {
    transcript: &'a Arc<Transcript>,
    config: DriveConfig,
    started: Instant,
    bridge: SharedBridge<HostBridge>,
    stop: AtomicBool,
    restart: AtomicBool,
}

impl<'a> BootedSystem<'a> {
    fn new(transcript: &'a Arc<Transcript>, config: DriveConfig) -> Self {
        Self {
            transcript,
            config,
            started: Instant::now(),
            bridge: SharedBridge::new(HostBridge::new(Arc::clone(transcript), config.pwm_period)),
            stop: AtomicBool::new(false),
            restart: AtomicBool::new(false),
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn run_guardian(&self, fault: Option<FaultInjection>, mut lamp: HostLamp) {
        let mut sense = InjectedSense::new(self.started, fault);
        let mut guardian = OvercurrentGuardian::new(self.config.debounce_ticks);
        let mut deadline = self.started;
        while !self.stopped() {
            deadline += self.config.guardian_period;
            sleep_until(deadline);
            match guardian.tick(&mut sense, &self.bridge, &mut lamp) {
                GuardianTick::Tripped(channel) => {
                    self.transcript.fault(
                        TranscriptRole::Guardian,
                        &format!("overcurrent latched on channel {channel}"),
                    );
                    return;
                }
                GuardianTick::Suspect { channel, count } => self.transcript.line(
                    TranscriptRole::Guardian,
                    &format!("channel {channel} over threshold ({count})"),
                ),
                GuardianTick::Clean(_) => {}
                GuardianTick::Halted => return,
            }
        }
    }

    fn run_watchdog(&self, press: Option<ButtonPress>) {
        let mut button = ScriptedButton::new(self.started, press);
        let mut handle = HostRestart::new(&self.restart);
        let mut watchdog = ResetWatchdog::new(self.config.hold_ticks, self.config.reset_policy);
        let mut deadline = self.started;
        while !self.stopped() {
            deadline += self.config.watchdog_period;
            sleep_until(deadline);
            match watchdog.tick(&mut button, &mut handle, self.bridge.is_tripped()) {
                HoldTick::Holding(held) => self.transcript.line(
                    TranscriptRole::Watchdog,
                    &format!("button held {held}/{}", self.config.hold_ticks),
                ),
                HoldTick::ResetRequested => {
                    self.transcript
                        .fault(TranscriptRole::Watchdog, "full reset requested");
                    return;
                }
                HoldTick::Disarmed => self
                    .transcript
                    .line(TranscriptRole::Watchdog, "button ignored while latched"),
                HoldTick::Released => {}
            }
        }
    }

    /// The foreground: the mission once, then the idle window.
    async fn run_mission(&self) -> MissionReport {
        let report = DRIVE_THEN_PIVOT.run(&self.bridge, &mut HostTimer).await;
        if report.preempted() {
            self.transcript.fault(
                TranscriptRole::Mission,
                &format!(
                    "preempted: {} applied, {} refused",
                    report.applied, report.rejected
                ),
            );
        } else {
            self.transcript
                .line(TranscriptRole::Mission, "complete; outputs zeroed");
        }
        HostTimer.hold(IDLE_AFTER_MISSION).await;
        report
    }
}
