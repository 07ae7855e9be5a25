//! Error types shared by the alarm core and the platform interfaces.

use crate::alarm::Phase;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The user refused one or more permissions. Non-fatal: later calls
    /// that need the permission fail where they are made.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Notification dispatch failed: {0}")]
    NotificationDispatch(String),

    #[error("Sound cleanup failed: {0}")]
    Cleanup(String),

    #[error("Cannot {operation} while alarm is {phase}")]
    InvalidPhase {
        phase: Phase,
        operation: &'static str,
    },

    #[error("Invalid alarm time: {0}")]
    InvalidTime(String),

    #[error("Dismiss distance must be between {min} and {max} m, got {value}")]
    InvalidDismissDistance { value: u8, min: u8, max: u8 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Alarm task is not running")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, Error>;
