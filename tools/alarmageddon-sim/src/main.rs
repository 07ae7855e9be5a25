//! Replay a location track against the alarm state machine.
//!
//! The alarm runs against in-memory platform services on a paused tokio
//! clock, so a morning's worth of polling finishes instantly. Each state
//! change is printed with the simulated wall-clock time, followed by the
//! notifications that would have been shown.

mod track;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use alarmageddon::alarm::AlarmTime;
use alarmageddon::clock::{Clock, SimulatedClock};
use alarmageddon::permission::PermissionGate;
use alarmageddon::platform::Platform;
use alarmageddon::platform::sim::{RecordingAudio, RecordingNotifications, ScriptedLocation};
use alarmageddon::{AlarmConfig, AlarmSnapshot, AlarmStateMachine, Phase, Settings};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use time::macros::format_description;
use time::{OffsetDateTime, Time};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "alarmageddon-sim")]
#[command(about = "Replay a location track against the alarm", long_about = None)]
struct Args {
    /// CSV file with `latitude,longitude` rows, one per location fix
    track: PathBuf,

    /// Simulated time of day when the alarm is set (HH:MM)
    #[arg(long, default_value = "06:55", value_parser = parse_hhmm)]
    start: Time,

    /// Time the alarm rings (HH:MM)
    #[arg(long, default_value = "07:00", value_parser = parse_hhmm)]
    alarm: Time,

    /// Dismiss distance in meters (1-5)
    #[arg(short, long, default_value_t = 1)]
    distance: u8,

    /// Make the alarm sound fail to load
    #[arg(long)]
    sound_fails: bool,

    /// Give up if the alarm is still ringing after this many minutes
    #[arg(long, default_value_t = 60)]
    max_ring_minutes: u64,
}

fn parse_hhmm(s: &str) -> Result<Time, String> {
    Time::parse(s, format_description!("[hour]:[minute]"))
        .map_err(|e| format!("expected HH:MM: {e}"))
}

#[tokio::main(flavor = "current_thread", start_paused = true)]
async fn main() -> ExitCode {
    alarmageddon::tracing::init_journald_or_stdout();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let fixes = track::load(&args.track)?;
    let ring_at = AlarmTime::from(args.alarm);
    info!(fixes = fixes.len(), track = %args.track.display(), "Loaded track");

    let start = OffsetDateTime::now_utc().replace_time(args.start);
    let clock = Arc::new(SimulatedClock::starting_at(start));

    let location = Arc::new(ScriptedLocation::new(fixes));
    let notifications = Arc::new(RecordingNotifications::new());
    let audio = Arc::new(RecordingAudio::new());
    audio.fail_load(args.sound_fails);

    let status = PermissionGate::new(location.clone(), notifications.clone())
        .acquire()
        .await;
    if let Some(warning) = status.warning() {
        println!("{}", warning.yellow());
    }

    let settings = Settings::new();
    settings.set_dismiss_distance(args.distance)?;

    let config = AlarmConfig::from_env()?;
    let poll_interval = config.poll_interval;
    let platform = Platform {
        location: location.clone(),
        notifications: notifications.clone(),
        audio: audio.clone(),
        clock: clock.clone(),
    };

    let (machine, handle) = AlarmStateMachine::new(config, platform, settings.subscribe());
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(machine.run(shutdown.clone()));

    println!(
        "{} {} dismiss distance {}, polling every {}s",
        stamp(clock.now()),
        "start".bold(),
        settings.dismiss_distance(),
        poll_interval.as_secs()
    );

    let mut updates = handle.subscribe();
    let outcome = match handle.schedule(ring_at).await {
        Ok(at) => {
            let until_wake = (at - clock.now()).unsigned_abs();
            let budget = until_wake + Duration::from_secs(args.max_ring_minutes * 60);
            match tokio::time::timeout(budget, follow(&mut updates, clock.as_ref())).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "alarm still ringing after {} minutes",
                    args.max_ring_minutes
                )),
            }
        }
        Err(e) => Err(anyhow::Error::from(e).context("scheduling failed")),
    };

    shutdown.cancel();
    task.await.context("alarm task panicked")?;

    report(&notifications.log().titles(), location.reads(), &audio.log());
    outcome
}

/// Print every state change until the alarm is back to idle.
async fn follow(
    updates: &mut tokio::sync::watch::Receiver<AlarmSnapshot>,
    clock: &dyn Clock,
) -> Result<()> {
    loop {
        let snapshot = updates.borrow_and_update().clone();
        print_snapshot(&snapshot, clock.now());

        if snapshot.phase == Phase::Idle {
            return match snapshot.last_failure {
                Some(reason) => Err(anyhow!("alarm failed: {reason}")),
                None => Ok(()),
            };
        }

        updates.changed().await.context("alarm task stopped")?;
    }
}

fn print_snapshot(snapshot: &AlarmSnapshot, now: OffsetDateTime) {
    let phase = match snapshot.phase {
        Phase::Idle => snapshot.phase.to_string().green(),
        Phase::Scheduled => snapshot.phase.to_string().cyan(),
        Phase::Active => snapshot.phase.to_string().red().bold(),
    };
    let origin = snapshot
        .origin
        .map(|o| format!(" origin {o}"))
        .unwrap_or_default();
    println!("{} {phase} {}{origin}", stamp(now), snapshot.status_line());
}

fn report(titles: &[&str], reads: usize, audio: &alarmageddon::platform::sim::AudioLog) {
    println!();
    println!("{}", "Notifications".bold());
    if titles.is_empty() {
        println!("  (none)");
    }
    for title in titles {
        println!("  {title}");
    }
    println!(
        "{} {reads} location fixes, {} sound loads, {} still loaded",
        "Totals".bold(),
        audio.loads,
        audio.loaded.len()
    );
}

fn stamp(at: OffsetDateTime) -> String {
    format!("[{:02}:{:02}:{:02}]", at.hour(), at.minute(), at.second())
        .dimmed()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hhmm() {
        let t = parse_hhmm("07:05").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (7, 5, 0));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(parse_hhmm("7:5pm").is_err());
        assert!(parse_hhmm("24:00").is_err());
        assert!(parse_hhmm("").is_err());
    }
}
