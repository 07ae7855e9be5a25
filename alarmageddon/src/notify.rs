//! User-visible notifications for alarm events.
//!
//! Notifications are a secondary channel next to the sound and the UI
//! state, so every failure here is logged and dropped.

use std::sync::Arc;

use crate::platform::{Notification, NotificationService, NotificationTrigger};
use crate::tracing::prelude::*;

pub const WAKE_TITLE: &str = "Wake Up!";
pub const WAKE_BODY: &str = "Move to a different location to dismiss the alarm";
pub const DISMISSED_TITLE: &str = "Alarm Dismissed!";
pub const DISMISSED_BODY: &str = "You've successfully moved and dismissed the alarm";
pub const FAILED_TITLE: &str = "Alarm Failed";

pub struct NotificationDispatcher {
    service: Arc<dyn NotificationService>,
    trigger: NotificationTrigger,
}

impl NotificationDispatcher {
    pub fn new(service: Arc<dyn NotificationService>, trigger: NotificationTrigger) -> Self {
        Self { service, trigger }
    }

    /// Show an alert with sound, as soon as the configured trigger allows.
    pub async fn fire_immediate(&self, title: &str, body: &str) {
        let notification = Notification {
            title: title.to_owned(),
            body: body.to_owned(),
            sound: true,
            trigger: self.trigger,
        };

        match self.service.schedule(notification).await {
            Ok(()) => debug!(title, "Notification dispatched"),
            Err(e) => warn!(title, error = %e, "Failed to dispatch notification"),
        }
    }

    /// Drop any notification still waiting for its trigger.
    pub async fn cancel_all_pending(&self) {
        if let Err(e) = self.service.cancel_all().await {
            warn!(error = %e, "Failed to cancel pending notifications");
        }
    }
}
