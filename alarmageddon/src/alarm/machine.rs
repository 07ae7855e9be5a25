//! The alarm state machine.
//!
//! # State Machine
//!
//! ```text
//!           schedule()              wake timer fires
//!  Idle ─────────────────► Scheduled ───────────────────► Active
//!   ▲                          │                            │
//!   │         cancel()         │                            │
//!   ├──────────────────────────┘                            │
//!   │      sound fails to load (from Scheduled)             │
//!   ├───────────────────────────────────────────────────────┤
//!   │      moved beyond dismiss distance                    │
//!   └───────────────────────────────────────────────────────┘
//! ```
//!
//! - **Idle:** Nothing armed. `schedule()` takes an origin fix, computes
//!   the next occurrence of the chosen time and arms the wake timer.
//! - **Scheduled:** Wake timer pending. `cancel()` drops it.
//! - **Active:** Sound looping; the location is polled every
//!   `poll_interval` and compared against the origin. The first fix
//!   further away than the dismiss distance stops the alarm.
//!
//! The machine runs as a single task. Commands, the wake timer and poll
//! ticks are all handled from one `select!` loop, so no two of them ever
//! run concurrently: a dropped timer cannot fire, and a slow location fix
//! delays (and with `MissedTickBehavior::Skip`, skips) later ticks rather
//! than overlapping them.

use std::future;
use std::pin::Pin;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;

use super::commands::{AlarmCommand, AlarmHandle};
use super::schedule::{AlarmTime, next_occurrence};
use super::session::{AlarmSnapshot, Session};
use crate::clock::Clock;
use crate::config::AlarmConfig;
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::notify::{
    DISMISSED_BODY, DISMISSED_TITLE, FAILED_TITLE, NotificationDispatcher, WAKE_BODY, WAKE_TITLE,
};
use crate::platform::{LocationProvider, Platform};
use crate::settings::DismissDistance;
use crate::sound::SoundController;
use crate::tracing::prelude::*;

pub struct AlarmStateMachine {
    config: AlarmConfig,
    clock: Arc<dyn Clock>,
    location: Arc<dyn LocationProvider>,
    sound: SoundController,
    notifier: NotificationDispatcher,
    dismiss_distance_rx: watch::Receiver<DismissDistance>,
    command_rx: mpsc::Receiver<AlarmCommand>,
    snapshot_tx: watch::Sender<AlarmSnapshot>,
    session: Session,
    selected_time: Option<AlarmTime>,
    last_failure: Option<String>,
    /// Armed only while Scheduled.
    wake_timer: Option<Pin<Box<Sleep>>>,
    /// Running only while Active.
    poll: Option<Interval>,
}

impl AlarmStateMachine {
    /// Build the machine and a handle to drive it. Nothing happens until
    /// [`run`](Self::run) is spawned.
    pub fn new(
        config: AlarmConfig,
        platform: Platform,
        dismiss_distance_rx: watch::Receiver<DismissDistance>,
    ) -> (Self, AlarmHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(AlarmSnapshot::idle());

        let machine = Self {
            sound: SoundController::new(platform.audio),
            notifier: NotificationDispatcher::new(
                platform.notifications,
                config.notification_trigger,
            ),
            clock: platform.clock,
            location: platform.location,
            config,
            dismiss_distance_rx,
            command_rx,
            snapshot_tx,
            session: Session::Idle,
            selected_time: None,
            last_failure: None,
            wake_timer: None,
            poll: None,
        };

        (machine, AlarmHandle::new(command_tx, snapshot_rx))
    }

    /// Run until `shutdown` is cancelled, then tear the session down.
    ///
    /// Stop the machine through `shutdown` only. Aborting the task or
    /// dropping the runtime skips teardown, and a ringing sound is then
    /// never stopped or unloaded.
    pub async fn run(mut self, shutdown: CancellationToken) {
        debug!("Alarm task started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    break;
                }
                Some(command) = self.command_rx.recv() => {
                    self.handle_command(command).await;
                }
                _ = wake_elapsed(&mut self.wake_timer) => {
                    self.wake().await;
                }
                _ = poll_tick(&mut self.poll) => {
                    self.check_geofence().await;
                }
            }
        }

        self.teardown().await;
        debug!("Alarm task stopped");
    }

    async fn handle_command(&mut self, command: AlarmCommand) {
        match command {
            AlarmCommand::Schedule { time, reply } => {
                let result = self.schedule(time).await;
                if reply.send(result).is_err() {
                    debug!("Schedule caller went away before reply");
                }
            }
            AlarmCommand::Cancel { reply } => {
                let result = self.cancel().await;
                if reply.send(result).is_err() {
                    debug!("Cancel caller went away before reply");
                }
            }
        }
    }

    /// Idle → Scheduled.
    async fn schedule(&mut self, time: AlarmTime) -> Result<OffsetDateTime> {
        if !matches!(self.session, Session::Idle) {
            return Err(Error::InvalidPhase {
                phase: self.session.phase(),
                operation: "schedule",
            });
        }

        self.last_failure = None;
        let scheduled_at = next_occurrence(self.clock.now(), time);

        let origin = match self.read_location().await {
            Ok(origin) => origin,
            Err(e) => {
                warn!(error = %e, time = %time, "Cannot schedule alarm without a location fix");
                self.publish();
                return Err(e);
            }
        };

        // The fix may have taken a while; a deadline already passed fires
        // on the next loop iteration.
        let delay = std::time::Duration::try_from(scheduled_at - self.clock.now())
            .unwrap_or(std::time::Duration::ZERO);
        self.wake_timer = Some(Box::pin(tokio::time::sleep(delay)));
        self.selected_time = Some(time);
        self.session = Session::Scheduled {
            scheduled_at,
            origin,
        };

        info!(
            scheduled_at = %scheduled_at,
            origin = %origin,
            delay_s = delay.as_secs(),
            "Alarm scheduled"
        );
        self.publish();
        Ok(scheduled_at)
    }

    /// Scheduled → Idle.
    async fn cancel(&mut self) -> Result<()> {
        if !matches!(self.session, Session::Scheduled { .. }) {
            return Err(Error::InvalidPhase {
                phase: self.session.phase(),
                operation: "cancel",
            });
        }

        self.wake_timer = None;
        self.notifier.cancel_all_pending().await;
        self.session = Session::Idle;

        info!("Alarm cancelled");
        self.publish();
        Ok(())
    }

    /// Scheduled → Active, or back to Idle if the sound cannot be started.
    async fn wake(&mut self) {
        self.wake_timer = None;

        let Session::Scheduled {
            scheduled_at,
            origin,
        } = self.session
        else {
            warn!(phase = %self.session.phase(), "Wake timer fired outside Scheduled");
            return;
        };

        self.notifier.cancel_all_pending().await;

        let sound = match self.sound.load(&self.config.sound).await {
            Ok(sound) => sound,
            Err(e) => {
                error!(error = %e, "Alarm sound failed to start; disarming");
                self.session = Session::Idle;
                self.last_failure = Some(e.to_string());
                self.notifier
                    .fire_immediate(FAILED_TITLE, &format!("The alarm could not ring: {e}"))
                    .await;
                self.publish();
                return;
            }
        };

        self.session = Session::Active {
            scheduled_at,
            origin,
            sound,
        };
        self.notifier.fire_immediate(WAKE_TITLE, WAKE_BODY).await;

        let period = self.config.poll_interval;
        let mut poll = tokio::time::interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.poll = Some(poll);

        info!(origin = %origin, "Alarm ringing");
        self.publish();
    }

    /// One poll tick while Active.
    async fn check_geofence(&mut self) {
        let Some(origin) = self.active_origin() else {
            self.poll = None;
            return;
        };

        let current = match self.read_location().await {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "Location check failed; retrying next tick");
                return;
            }
        };

        let distance_m = origin.distance_to(&current);
        let threshold = *self.dismiss_distance_rx.borrow();

        debug!(
            distance_m,
            threshold_m = threshold.meters(),
            current = %current,
            "Geofence check"
        );

        if distance_m > threshold.meters() {
            self.dismiss(distance_m).await;
        }
    }

    /// Active → Idle. Sound first, state last.
    async fn dismiss(&mut self, distance_m: f64) {
        self.poll = None;

        if let Session::Active { sound, .. } = &mut self.session {
            self.sound.stop_and_release(sound).await;
        }
        self.notifier.cancel_all_pending().await;
        self.notifier
            .fire_immediate(DISMISSED_TITLE, DISMISSED_BODY)
            .await;
        self.session = Session::Idle;

        info!(distance_m, "Alarm dismissed");
        self.publish();
    }

    /// Release whatever the session holds.
    async fn teardown(&mut self) {
        self.wake_timer = None;
        self.poll = None;

        if let Session::Active { sound, .. } = &mut self.session {
            self.sound.stop_and_release(sound).await;
        }
        if !matches!(self.session, Session::Idle) {
            info!(phase = %self.session.phase(), "Alarm torn down");
        }
        self.session = Session::Idle;
        self.publish();
    }

    fn active_origin(&self) -> Option<Coordinates> {
        match &self.session {
            Session::Active { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    async fn read_location(&self) -> Result<Coordinates> {
        let timeout = self.config.location_timeout;
        match tokio::time::timeout(timeout, self.location.current_position()).await {
            Ok(Ok(fix)) if fix.is_valid() => Ok(fix),
            Ok(Ok(fix)) => Err(Error::LocationUnavailable(format!("invalid fix {fix}"))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::LocationUnavailable(format!(
                "no fix within {} s",
                timeout.as_secs()
            ))),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(AlarmSnapshot {
            phase: self.session.phase(),
            selected_time: self.selected_time,
            scheduled_at: self.session.scheduled_at(),
            origin: self.session.origin(),
            last_failure: self.last_failure.clone(),
        });
    }
}

async fn wake_elapsed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}

async fn poll_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}
