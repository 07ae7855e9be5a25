//! Alarmageddon: an alarm clock that only goes quiet once you have moved.
//!
//! When the alarm fires it starts a looping sound and keeps polling the
//! device location. The sound stops only after the device has travelled
//! further than the configured dismiss distance from where the alarm was
//! set.
//!
//! Platform services (location, notifications, audio) are reached through
//! the traits in [`platform`]; everything else here is plain logic that can
//! run against the in-memory implementations in [`platform::sim`].

pub mod alarm;
pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod notify;
pub mod permission;
pub mod platform;
pub mod settings;
pub mod sound;
pub mod tracing;

pub use alarm::{AlarmHandle, AlarmSnapshot, AlarmStateMachine, Phase};
pub use config::AlarmConfig;
pub use error::{Error, Result};
pub use settings::{DismissDistance, Settings};
