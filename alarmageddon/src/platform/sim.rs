//! In-memory platform services.
//!
//! Used by the unit tests and by `alarmageddon-sim`. Each service records
//! what it was asked to do and can be told to fail, so callers can check
//! both the happy path and the degraded ones.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::{
    AudioId, AudioService, LocationProvider, Notification, NotificationService, PlaybackOptions,
    SoundResource,
};
use crate::error::{Error, Result};
use crate::geo::Coordinates;

/// How a simulated permission prompt is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionAnswer {
    #[default]
    Granted,
    Denied,
    /// The permission service itself fails.
    Unavailable,
}

impl PermissionAnswer {
    fn resolve(self, unavailable: impl FnOnce() -> Error) -> Result<bool> {
        match self {
            PermissionAnswer::Granted => Ok(true),
            PermissionAnswer::Denied => Ok(false),
            PermissionAnswer::Unavailable => Err(unavailable()),
        }
    }
}

/// One entry of a location script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationFix {
    At(Coordinates),
    Unavailable,
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<LocationFix>,
    last: Option<LocationFix>,
}

/// Location provider that replays a queue of fixes.
///
/// Each read consumes one entry. Once the queue is empty the last entry
/// is repeated, so a stationary device needs only a single fix.
#[derive(Debug)]
pub struct ScriptedLocation {
    permission: PermissionAnswer,
    fix_delay: Duration,
    script: Mutex<Script>,
    reads: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedLocation {
    pub fn new(fixes: impl IntoIterator<Item = LocationFix>) -> Self {
        Self {
            permission: PermissionAnswer::Granted,
            fix_delay: Duration::ZERO,
            script: Mutex::new(Script {
                queue: fixes.into_iter().collect(),
                last: None,
            }),
            reads: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn stationary(at: Coordinates) -> Self {
        Self::new([LocationFix::At(at)])
    }

    pub fn with_permission(mut self, answer: PermissionAnswer) -> Self {
        self.permission = answer;
        self
    }

    /// Make every fix take `delay` of tokio time.
    pub fn with_fix_delay(mut self, delay: Duration) -> Self {
        self.fix_delay = delay;
        self
    }

    /// Append fixes to the end of the script.
    pub fn push(&self, fixes: impl IntoIterator<Item = LocationFix>) {
        self.script.lock().queue.extend(fixes);
    }

    /// Number of position reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Most position reads that were ever outstanding at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_fix(&self) -> LocationFix {
        let mut script = self.script.lock();
        match script.queue.pop_front() {
            Some(fix) => {
                script.last = Some(fix);
                fix
            }
            None => script.last.unwrap_or(LocationFix::Unavailable),
        }
    }
}

#[async_trait]
impl LocationProvider for ScriptedLocation {
    async fn request_permission(&self) -> Result<bool> {
        self.permission
            .resolve(|| Error::LocationUnavailable("permission service unavailable".into()))
    }

    async fn current_position(&self) -> Result<Coordinates> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if !self.fix_delay.is_zero() {
            tokio::time::sleep(self.fix_delay).await;
        }
        let fix = self.next_fix();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match fix {
            LocationFix::At(position) => Ok(position),
            LocationFix::Unavailable => Err(Error::LocationUnavailable("no GPS fix".into())),
        }
    }
}

/// Everything [`RecordingAudio`] has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct AudioLog {
    pub loads: usize,
    pub stops: usize,
    pub unloads: usize,
    /// Sounds loaded and not yet unloaded.
    pub loaded: Vec<AudioId>,
    /// Loaded sounds that are audible right now.
    pub playing: Vec<AudioId>,
    pub last_resource: Option<SoundResource>,
    pub last_options: Option<PlaybackOptions>,
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    log: Mutex<AudioLog>,
    next_id: AtomicU64,
    fail_load: AtomicBool,
    fail_stop: AtomicBool,
    fail_unload: AtomicBool,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn fail_unload(&self, fail: bool) {
        self.fail_unload.store(fail, Ordering::SeqCst);
    }

    pub fn log(&self) -> AudioLog {
        self.log.lock().clone()
    }

    pub fn is_playing(&self) -> bool {
        !self.log.lock().playing.is_empty()
    }
}

#[async_trait]
impl AudioService for RecordingAudio {
    async fn load(&self, resource: &SoundResource, options: PlaybackOptions) -> Result<AudioId> {
        let mut log = self.log.lock();
        log.loads += 1;
        log.last_resource = Some(resource.clone());
        log.last_options = Some(options);

        if self.fail_load.load(Ordering::SeqCst) {
            return Err(Error::Playback(format!("cannot decode {resource}")));
        }

        let id = AudioId(self.next_id.fetch_add(1, Ordering::SeqCst));
        log.loaded.push(id);
        if options.autoplay {
            log.playing.push(id);
        }
        Ok(id)
    }

    async fn stop(&self, id: AudioId) -> Result<()> {
        let mut log = self.log.lock();
        log.stops += 1;

        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(Error::Cleanup(format!("stop {id:?}: device busy")));
        }
        if !log.loaded.contains(&id) {
            return Err(Error::Cleanup(format!("stop {id:?}: not loaded")));
        }
        log.playing.retain(|playing| *playing != id);
        Ok(())
    }

    async fn unload(&self, id: AudioId) -> Result<()> {
        let mut log = self.log.lock();
        log.unloads += 1;

        if self.fail_unload.load(Ordering::SeqCst) {
            return Err(Error::Cleanup(format!("unload {id:?}: device busy")));
        }
        if !log.loaded.contains(&id) {
            return Err(Error::Cleanup(format!("unload {id:?}: not loaded")));
        }
        log.loaded.retain(|loaded| *loaded != id);
        log.playing.retain(|playing| *playing != id);
        Ok(())
    }
}

/// Everything [`RecordingNotifications`] has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    pub delivered: Vec<Notification>,
    pub cancel_all_calls: usize,
    pub failed_dispatches: usize,
}

impl NotificationLog {
    pub fn titles(&self) -> Vec<&str> {
        self.delivered.iter().map(|n| n.title.as_str()).collect()
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifications {
    permission: PermissionAnswer,
    log: Mutex<NotificationLog>,
    fail_schedule: AtomicBool,
    fail_cancel: AtomicBool,
}

impl RecordingNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permission(mut self, answer: PermissionAnswer) -> Self {
        self.permission = answer;
        self
    }

    pub fn fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    pub fn fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub fn log(&self) -> NotificationLog {
        self.log.lock().clone()
    }
}

#[async_trait]
impl NotificationService for RecordingNotifications {
    async fn request_permission(&self) -> Result<bool> {
        self.permission
            .resolve(|| Error::NotificationDispatch("permission service unavailable".into()))
    }

    async fn schedule(&self, notification: Notification) -> Result<()> {
        let mut log = self.log.lock();
        if self.fail_schedule.load(Ordering::SeqCst) {
            log.failed_dispatches += 1;
            return Err(Error::NotificationDispatch(format!(
                "cannot deliver {:?}",
                notification.title
            )));
        }
        log.delivered.push(notification);
        Ok(())
    }

    async fn cancel_all(&self) -> Result<()> {
        let mut log = self.log.lock();
        log.cancel_all_calls += 1;
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(Error::NotificationDispatch("cancel rejected".into()));
        }
        Ok(())
    }
}
