use std::io;

#[allow(dead_code)]
#[path = "../host.rs"]
mod host;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{ScenarioProfile, Session, Transcript};

fn main() -> io::Result<()> {
    for profile in ScenarioProfile::ALL {
        record_profile(profile)?;
    }
    Ok(())
}

fn record_profile(profile: ScenarioProfile) -> io::Result<()> {
    let transcript = Transcript::to_file(profile, false)?;
    let session = Session::new(profile, transcript).map_err(io::Error::other)?;
    let summary = session.run()?;
    println!(
        "{}: {} boot(s), {} restart(s) -> {}",
        profile.tag(),
        summary.boots.len(),
        summary.restarts(),
        profile.log_path()
    );
    Ok(())
}
