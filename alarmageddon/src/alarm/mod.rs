//! The alarm itself: scheduling, ringing, and geofence dismissal.

mod commands;
mod machine;
mod schedule;
mod session;

pub use commands::AlarmHandle;
pub use machine::AlarmStateMachine;
pub use schedule::{AlarmTime, next_occurrence};
pub use session::{AlarmSnapshot, Phase};
