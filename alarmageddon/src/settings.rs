//! User-adjustable settings shared between the settings surface and the
//! alarm.
//!
//! The settings surface writes through [`Settings`]; the alarm holds a
//! `watch::Receiver` handed over at construction and reads the latest
//! value on every poll tick.

use tokio::sync::watch;

use crate::error::{Error, Result};

/// How far the device must move from the alarm origin, in whole meters,
/// before the alarm is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DismissDistance(u8);

impl DismissDistance {
    pub const MIN_M: u8 = 1;
    pub const MAX_M: u8 = 5;

    pub fn new(meters: u8) -> Result<Self> {
        if (Self::MIN_M..=Self::MAX_M).contains(&meters) {
            Ok(Self(meters))
        } else {
            Err(Error::InvalidDismissDistance {
                value: meters,
                min: Self::MIN_M,
                max: Self::MAX_M,
            })
        }
    }

    pub fn meters(self) -> f64 {
        f64::from(self.0)
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl Default for DismissDistance {
    fn default() -> Self {
        Self(Self::MIN_M)
    }
}

impl std::fmt::Display for DismissDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} m", self.meters())
    }
}

/// Process-wide settings store.
#[derive(Debug)]
pub struct Settings {
    dismiss_distance_tx: watch::Sender<DismissDistance>,
}

impl Settings {
    pub fn new() -> Self {
        Self::with_dismiss_distance(DismissDistance::default())
    }

    pub fn with_dismiss_distance(distance: DismissDistance) -> Self {
        let (dismiss_distance_tx, _) = watch::channel(distance);
        Self {
            dismiss_distance_tx,
        }
    }

    pub fn dismiss_distance(&self) -> DismissDistance {
        *self.dismiss_distance_tx.borrow()
    }

    /// Update the dismiss distance. Out-of-range values are rejected and
    /// leave the current value in place.
    pub fn set_dismiss_distance(&self, meters: u8) -> Result<()> {
        let distance = DismissDistance::new(meters)?;
        // send_replace stores the value even when nobody is subscribed yet.
        self.dismiss_distance_tx.send_replace(distance);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<DismissDistance> {
        self.dismiss_distance_tx.subscribe()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
