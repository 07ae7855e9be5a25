//! Alarm sound lifecycle.
//!
//! Loading is the only step allowed to fail the caller. Releasing is
//! best-effort: stop and unload are attempted independently and their
//! errors are logged, so a broken audio device can never keep an alarm
//! from being dismissed.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::platform::{AudioId, AudioService, PlaybackOptions, SoundResource};
use crate::tracing::prelude::*;

const ALARM_PLAYBACK: PlaybackOptions = PlaybackOptions {
    looping: true,
    autoplay: true,
};

/// Exclusive ownership of a loaded alarm sound.
///
/// Released through [`SoundController::stop_and_release`]; a handle that
/// is dropped while still holding a sound logs a warning, since the
/// platform resource leaks.
#[derive(Debug)]
pub struct SoundHandle {
    id: Option<AudioId>,
    resource: SoundResource,
}

impl SoundHandle {
    pub fn id(&self) -> Option<AudioId> {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.id.is_none()
    }

    pub fn resource(&self) -> &SoundResource {
        &self.resource
    }
}

impl Drop for SoundHandle {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            warn!(id = ?id, resource = %self.resource, "Sound handle dropped without release");
        }
    }
}

pub struct SoundController {
    audio: Arc<dyn AudioService>,
}

impl SoundController {
    pub fn new(audio: Arc<dyn AudioService>) -> Self {
        Self { audio }
    }

    /// Load `resource` looping and start it playing.
    pub async fn load(&self, resource: &SoundResource) -> Result<SoundHandle> {
        let id = self
            .audio
            .load(resource, ALARM_PLAYBACK)
            .await
            .map_err(|e| match e {
                Error::Playback(_) => e,
                other => Error::Playback(other.to_string()),
            })?;

        debug!(id = ?id, resource = %resource, "Alarm sound loaded");
        Ok(SoundHandle {
            id: Some(id),
            resource: resource.clone(),
        })
    }

    /// Stop and unload the sound held by `handle`.
    ///
    /// Never fails. Calling it again on a released handle does nothing.
    pub async fn stop_and_release(&self, handle: &mut SoundHandle) {
        let Some(id) = handle.id.take() else {
            trace!(resource = %handle.resource, "Sound already released");
            return;
        };

        if let Err(e) = self.audio.stop(id).await {
            warn!(id = ?id, error = %e, "Failed to stop alarm sound");
        }
        if let Err(e) = self.audio.unload(id).await {
            warn!(id = ?id, error = %e, "Failed to unload alarm sound");
        }

        debug!(id = ?id, "Alarm sound released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::sim::RecordingAudio;

    fn controller() -> (SoundController, Arc<RecordingAudio>) {
        let audio = Arc::new(RecordingAudio::new());
        (SoundController::new(audio.clone()), audio)
    }

    #[tokio::test]
    async fn load_starts_looping_playback() {
        let (controller, audio) = controller();

        let mut handle = controller
            .load(&SoundResource::new("alarm.mp3"))
            .await
            .unwrap();

        assert!(audio.is_playing());
        let log = audio.log();
        assert_eq!(log.last_options, Some(ALARM_PLAYBACK));
        assert_eq!(log.last_resource, Some(SoundResource::new("alarm.mp3")));

        controller.stop_and_release(&mut handle).await;
    }

    #[tokio::test]
    async fn load_failure_is_a_playback_error() {
        let (controller, audio) = controller();
        audio.fail_load(true);

        let err = controller
            .load(&SoundResource::new("alarm.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Playback(_)));
        assert!(!audio.is_playing());
    }

    #[tokio::test]
    async fn release_stops_and_unloads() {
        let (controller, audio) = controller();
        let mut handle = controller
            .load(&SoundResource::new("alarm.mp3"))
            .await
            .unwrap();

        controller.stop_and_release(&mut handle).await;

        assert!(handle.is_released());
        let log = audio.log();
        assert_eq!((log.stops, log.unloads), (1, 1));
        assert!(log.loaded.is_empty());
    }

    #[tokio::test]
    async fn unload_is_attempted_when_stop_fails() {
        let (controller, audio) = controller();
        let mut handle = controller
            .load(&SoundResource::new("alarm.mp3"))
            .await
            .unwrap();
        audio.fail_stop(true);

        controller.stop_and_release(&mut handle).await;

        assert!(handle.is_released());
        let log = audio.log();
        assert_eq!((log.stops, log.unloads), (1, 1));
        assert!(log.loaded.is_empty());
    }

    #[tokio::test]
    async fn unload_failure_is_swallowed() {
        let (controller, audio) = controller();
        let mut handle = controller
            .load(&SoundResource::new("alarm.mp3"))
            .await
            .unwrap();
        audio.fail_unload(true);

        controller.stop_and_release(&mut handle).await;

        assert!(handle.is_released());
        assert_eq!(audio.log().unloads, 1);
    }

    #[tokio::test]
    async fn repeated_release_is_idempotent() {
        let (controller, audio) = controller();
        let mut handle = controller
            .load(&SoundResource::new("alarm.mp3"))
            .await
            .unwrap();

        controller.stop_and_release(&mut handle).await;
        controller.stop_and_release(&mut handle).await;
        controller.stop_and_release(&mut handle).await;

        let log = audio.log();
        assert_eq!((log.stops, log.unloads), (1, 1));
    }
}
