mod host;
mod session;

use std::env;
use std::io;
use std::process;

use session::{BootOutcome, ScenarioProfile, Session, Transcript};

fn main() -> io::Result<()> {
    let Options { profile, record } = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!(
            "Usage: drive-emulator [--profile <clean|overcurrent-a|overcurrent-b|reset|trip-reset>] [--record]"
        );
        process::exit(2);
    });

    println!("{}", profile.header());
    let transcript = if record {
        println!("Recording to {}", profile.log_path());
        Transcript::to_file(profile, true)?
    } else {
        Transcript::stdout()
    };
    let session = Session::new(profile, transcript).unwrap_or_else(|err| {
        eprintln!("invalid drive configuration: {err}");
        process::exit(2);
    });
    let summary = session.run()?;

    match summary.last() {
        Some(BootOutcome::Settled { report, tripped }) => println!(
            "Settled after {} boot(s) and {} restart(s): {} maneuver(s) applied, {} refused, latched={tripped}",
            summary.boots.len(),
            summary.restarts(),
            report.applied,
            report.rejected,
        ),
        Some(BootOutcome::Restarted) => {
            println!("Boot limit reached while restarting.");
        }
        None => {}
    }

    Ok(())
}

struct Options {
    profile: ScenarioProfile,
    record: bool,
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        profile: ScenarioProfile::Clean,
        record: false,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--record" {
            options.record = true;
        } else if let Some(value) = arg.strip_prefix("--profile=") {
            options.profile = ScenarioProfile::from_tag(value)?;
        } else if arg == "--profile" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --profile".to_string())?;
            options.profile = ScenarioProfile::from_tag(&value)?;
        } else {
            options.profile = ScenarioProfile::from_tag(&arg)?;
        }
    }
    Ok(options)
}
