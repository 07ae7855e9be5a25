//! Interfaces to the services the host platform provides.
//!
//! The alarm core never talks to a device directly. Location fixes,
//! notifications and audio playback all go through the traits below, and
//! every call may suspend while the platform does its work. Concrete
//! implementations are supplied by the embedding application;
//! [`sim`] contains in-memory ones for tests and the simulator.

pub mod sim;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::Result;
use crate::geo::Coordinates;

/// Source of device position fixes.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask the user for foreground location access.
    async fn request_permission(&self) -> Result<bool>;

    /// Take a high-accuracy fix. Fails with
    /// [`Error::LocationUnavailable`](crate::Error::LocationUnavailable).
    async fn current_position(&self) -> Result<Coordinates>;
}

/// When a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTrigger {
    /// Present right away.
    Immediate,
    /// Present after a short fixed delay.
    After(Duration),
}

/// A user-visible alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Play the platform notification sound alongside the alert.
    pub sound: bool,
    pub trigger: NotificationTrigger,
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn request_permission(&self) -> Result<bool>;

    /// Enqueue `notification` for presentation.
    async fn schedule(&self, notification: Notification) -> Result<()>;

    /// Drop every notification that has been scheduled but not yet shown.
    async fn cancel_all(&self) -> Result<()>;
}

/// Reference to a bundled audio asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundResource(pub String);

impl SoundResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for SoundResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub looping: bool,
    pub autoplay: bool,
}

/// Opaque platform identifier for a loaded sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioId(pub u64);

#[async_trait]
pub trait AudioService: Send + Sync {
    /// Decode `resource` and prepare it for playback. With `autoplay` the
    /// sound starts as soon as it is loaded.
    async fn load(&self, resource: &SoundResource, options: PlaybackOptions) -> Result<AudioId>;

    async fn stop(&self, id: AudioId) -> Result<()>;

    /// Free the decoded resource. Valid whether or not it was stopped.
    async fn unload(&self, id: AudioId) -> Result<()>;
}

/// The full set of platform services the alarm depends on.
#[derive(Clone)]
pub struct Platform {
    pub location: Arc<dyn LocationProvider>,
    pub notifications: Arc<dyn NotificationService>,
    pub audio: Arc<dyn AudioService>,
    pub clock: Arc<dyn Clock>,
}
