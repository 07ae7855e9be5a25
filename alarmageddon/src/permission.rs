//! One-shot permission acquisition at startup.
//!
//! Missing permissions are reported, not enforced: the alarm can still be
//! scheduled, and whatever needs the missing permission fails when it is
//! actually used.

use std::sync::Arc;

use crate::error::Error;
use crate::platform::{LocationProvider, NotificationService};
use crate::tracing::prelude::*;

pub const PERMISSIONS_REQUIRED: &str = "Location and notification permissions are required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionStatus {
    pub location_granted: bool,
    pub notification_granted: bool,
}

impl PermissionStatus {
    pub fn all_granted(&self) -> bool {
        self.location_granted && self.notification_granted
    }

    /// Warning to show the user, if anything was refused.
    pub fn warning(&self) -> Option<&'static str> {
        (!self.all_granted()).then_some(PERMISSIONS_REQUIRED)
    }

    /// `Err(PermissionDenied)` naming whatever was refused.
    pub fn check(&self) -> crate::Result<()> {
        let denied: Vec<&str> = [
            (!self.location_granted).then_some("location"),
            (!self.notification_granted).then_some("notifications"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if denied.is_empty() {
            Ok(())
        } else {
            Err(Error::PermissionDenied(denied.join(", ")))
        }
    }
}

pub struct PermissionGate {
    location: Arc<dyn LocationProvider>,
    notifications: Arc<dyn NotificationService>,
}

impl PermissionGate {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            location,
            notifications,
        }
    }

    /// Request both permissions concurrently.
    ///
    /// A failing permission service is logged and counted as a refusal.
    pub async fn acquire(&self) -> PermissionStatus {
        let (location, notification) = tokio::join!(
            self.location.request_permission(),
            self.notifications.request_permission()
        );

        let location_granted = location.unwrap_or_else(|e| {
            error!(error = %e, "Location permission request failed");
            false
        });
        let notification_granted = notification.unwrap_or_else(|e| {
            error!(error = %e, "Notification permission request failed");
            false
        });

        let status = PermissionStatus {
            location_granted,
            notification_granted,
        };

        match status.check() {
            Ok(()) => info!("Location and notification permissions granted"),
            Err(e) => warn!(error = %e, "{}", PERMISSIONS_REQUIRED),
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::platform::sim::{PermissionAnswer, RecordingNotifications, ScriptedLocation};
    use test_case::test_case;

    async fn acquire(location: PermissionAnswer, notifications: PermissionAnswer) -> PermissionStatus {
        let gate = PermissionGate::new(
            Arc::new(ScriptedLocation::stationary(Coordinates::default()).with_permission(location)),
            Arc::new(RecordingNotifications::new().with_permission(notifications)),
        );
        gate.acquire().await
    }

    #[tokio::test]
    async fn both_granted_has_no_warning() {
        let status = acquire(PermissionAnswer::Granted, PermissionAnswer::Granted).await;
        assert!(status.all_granted());
        assert_eq!(status.warning(), None);
        assert!(status.check().is_ok());
    }

    #[test_case(PermissionAnswer::Denied, PermissionAnswer::Granted, false, true; "location_denied")]
    #[test_case(PermissionAnswer::Granted, PermissionAnswer::Denied, true, false; "notifications_denied")]
    #[test_case(PermissionAnswer::Unavailable, PermissionAnswer::Granted, false, true; "location_service_down")]
    #[test_case(PermissionAnswer::Unavailable, PermissionAnswer::Unavailable, false, false; "both_services_down")]
    #[tokio::test]
    async fn refusals_and_failures_produce_warning(
        location: PermissionAnswer,
        notifications: PermissionAnswer,
        location_granted: bool,
        notification_granted: bool,
    ) {
        let status = acquire(location, notifications).await;

        assert_eq!(status.location_granted, location_granted);
        assert_eq!(status.notification_granted, notification_granted);
        assert_eq!(status.warning(), Some(PERMISSIONS_REQUIRED));
    }

    #[test]
    fn check_names_refused_permissions() {
        let status = PermissionStatus {
            location_granted: false,
            notification_granted: false,
        };

        let err = status.check().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Permission denied: location, notifications"
        );
    }
}
