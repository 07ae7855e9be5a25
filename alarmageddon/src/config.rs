//! Static configuration of the alarm core.
//!
//! Unlike [`Settings`](crate::Settings), these values are fixed for the
//! lifetime of an [`AlarmStateMachine`](crate::AlarmStateMachine).

use std::time::Duration;

use crate::error::{Error, Result};
use crate::platform::{NotificationTrigger, SoundResource};

const ENV_POLL_INTERVAL_SECS: &str = "ALARMAGEDDON_POLL_INTERVAL_SECS";
const ENV_LOCATION_TIMEOUT_SECS: &str = "ALARMAGEDDON_LOCATION_TIMEOUT_SECS";
const ENV_SOUND: &str = "ALARMAGEDDON_SOUND";
const ENV_NOTIFY_DELAY_SECS: &str = "ALARMAGEDDON_NOTIFY_DELAY_SECS";

#[derive(Debug, Clone)]
pub struct AlarmConfig {
    /// Period of the geofence check while the alarm is ringing.
    pub poll_interval: Duration,

    /// Upper bound on a single location fix. A fix that takes longer is
    /// treated as unavailable.
    pub location_timeout: Duration,

    /// Looping sound played while the alarm is active.
    pub sound: SoundResource,

    pub notification_trigger: NotificationTrigger,

    /// Capacity of the command channel between handles and the alarm task.
    pub command_buffer: usize,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            location_timeout: Duration::from_secs(15),
            sound: SoundResource::new("alarm.mp3"),
            notification_trigger: NotificationTrigger::Immediate,
            command_buffer: 8,
        }
    }
}

impl AlarmConfig {
    /// Defaults overridden by `ALARMAGEDDON_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `ALARMAGEDDON_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(secs) = parse_secs(&lookup, ENV_POLL_INTERVAL_SECS)? {
            if secs == 0 {
                return Err(Error::Config(format!(
                    "{ENV_POLL_INTERVAL_SECS} must be at least 1"
                )));
            }
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_secs(&lookup, ENV_LOCATION_TIMEOUT_SECS)? {
            config.location_timeout = Duration::from_secs(secs);
        }

        if let Some(sound) = lookup(ENV_SOUND).filter(|s| !s.trim().is_empty()) {
            config.sound = SoundResource::new(sound.trim());
        }

        if let Some(secs) = parse_secs(&lookup, ENV_NOTIFY_DELAY_SECS)? {
            config.notification_trigger = match secs {
                0 => NotificationTrigger::Immediate,
                n => NotificationTrigger::After(Duration::from_secs(n)),
            };
        }

        Ok(config)
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AlarmConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.location_timeout, Duration::from_secs(15));
        assert_eq!(config.sound, SoundResource::new("alarm.mp3"));
        assert_eq!(config.notification_trigger, NotificationTrigger::Immediate);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AlarmConfig::from_lookup(lookup_from(&[
            (ENV_POLL_INTERVAL_SECS, "10"),
            (ENV_LOCATION_TIMEOUT_SECS, " 30 "),
            (ENV_SOUND, "klaxon.wav"),
            (ENV_NOTIFY_DELAY_SECS, "1"),
        ]))
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.location_timeout, Duration::from_secs(30));
        assert_eq!(config.sound, SoundResource::new("klaxon.wav"));
        assert_eq!(
            config.notification_trigger,
            NotificationTrigger::After(Duration::from_secs(1))
        );
    }

    #[test]
    fn zero_notify_delay_means_immediate() {
        let config =
            AlarmConfig::from_lookup(lookup_from(&[(ENV_NOTIFY_DELAY_SECS, "0")])).unwrap();
        assert_eq!(config.notification_trigger, NotificationTrigger::Immediate);
    }

    #[test]
    fn rejects_unparseable_number() {
        let err =
            AlarmConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains(ENV_POLL_INTERVAL_SECS)));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err =
            AlarmConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL_SECS, "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn blank_sound_keeps_default() {
        let config = AlarmConfig::from_lookup(lookup_from(&[(ENV_SOUND, "  ")])).unwrap();
        assert_eq!(config.sound, SoundResource::new("alarm.mp3"));
    }
}
