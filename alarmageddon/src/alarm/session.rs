use time::OffsetDateTime;

use super::schedule::AlarmTime;
use crate::geo::Coordinates;
use crate::sound::SoundHandle;

/// Coarse lifecycle state of the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Idle,
    Scheduled,
    Active,
}

/// The mutable alarm state, owned by the state machine task.
///
/// Data that only makes sense in one phase lives in that variant, so an
/// origin without a sound (or the reverse) cannot be represented while
/// ringing.
#[derive(Debug)]
pub(super) enum Session {
    Idle,
    Scheduled {
        scheduled_at: OffsetDateTime,
        /// Fix taken when the alarm was set. Becomes the geofence centre
        /// once the alarm fires.
        origin: Coordinates,
    },
    Active {
        scheduled_at: OffsetDateTime,
        origin: Coordinates,
        sound: SoundHandle,
    },
}

impl Session {
    pub(super) fn phase(&self) -> Phase {
        match self {
            Session::Idle => Phase::Idle,
            Session::Scheduled { .. } => Phase::Scheduled,
            Session::Active { .. } => Phase::Active,
        }
    }

    pub(super) fn scheduled_at(&self) -> Option<OffsetDateTime> {
        match self {
            Session::Idle => None,
            Session::Scheduled { scheduled_at, .. } | Session::Active { scheduled_at, .. } => {
                Some(*scheduled_at)
            }
        }
    }

    pub(super) fn origin(&self) -> Option<Coordinates> {
        match self {
            Session::Idle => None,
            Session::Scheduled { origin, .. } | Session::Active { origin, .. } => Some(*origin),
        }
    }
}

/// Read-only view of the alarm for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSnapshot {
    pub phase: Phase,
    /// Time of day most recently passed to `schedule`.
    pub selected_time: Option<AlarmTime>,
    pub scheduled_at: Option<OffsetDateTime>,
    pub origin: Option<Coordinates>,
    /// Why the last alarm stopped without being dismissed, if it did.
    pub last_failure: Option<String>,
}

impl AlarmSnapshot {
    pub(super) fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            selected_time: None,
            scheduled_at: None,
            origin: None,
            last_failure: None,
        }
    }

    /// One-line status text for the alarm screen.
    pub fn status_line(&self) -> String {
        match (self.phase, self.scheduled_at) {
            (Phase::Scheduled, Some(at)) => format!(
                "Alarm Scheduled! Alarm will ring at {:02}:{:02}",
                at.hour(),
                at.minute()
            ),
            (Phase::Active, _) => "Alarm Active! Move to a different location to dismiss".into(),
            _ => "No alarm set".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn phase_displays_lowercase() {
        assert_eq!(Phase::Idle.to_string(), "idle");
        assert_eq!(Phase::Scheduled.to_string(), "scheduled");
        assert_eq!(Phase::Active.to_string(), "active");
    }

    #[test]
    fn status_line_per_phase() {
        let mut snapshot = AlarmSnapshot::idle();
        assert_eq!(snapshot.status_line(), "No alarm set");

        snapshot.phase = Phase::Scheduled;
        snapshot.scheduled_at = Some(datetime!(2026-10-18 7:05 UTC));
        assert_eq!(
            snapshot.status_line(),
            "Alarm Scheduled! Alarm will ring at 07:05"
        );

        snapshot.phase = Phase::Active;
        assert_eq!(
            snapshot.status_line(),
            "Alarm Active! Move to a different location to dismiss"
        );
    }

    #[test]
    fn idle_session_has_no_schedule_or_origin() {
        let session = Session::Idle;
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.scheduled_at(), None);
        assert_eq!(session.origin(), None);
    }

    #[test]
    fn scheduled_session_exposes_provisional_origin() {
        let session = Session::Scheduled {
            scheduled_at: datetime!(2026-10-18 7:00 UTC),
            origin: Coordinates::new(1.0, 2.0),
        };
        assert_eq!(session.phase(), Phase::Scheduled);
        assert_eq!(session.origin(), Some(Coordinates::new(1.0, 2.0)));
    }
}
