use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: String,
    pub zone_number: u32,
    pub name: String,
    pub enabled: bool,
}

/// Device-reported rain delay window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainDelayState {
    pub start: Option<DateTime<Utc>>,
    pub expiration: Option<DateTime<Utc>>,
}

impl RainDelayState {
    #[cfg(test)]
    pub fn new(start: DateTime<Utc>, expiration: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            expiration: Some(expiration),
        }
    }

    /// A window is open when it is well-formed (`expiration >= start`) and has
    /// not yet expired at `now`. Both boundaries are inclusive.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match (self.start, self.expiration) {
            (Some(start), Some(expiration)) => expiration >= start && now <= expiration,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceState {
    pub device_id: String,
    pub name: String,
    pub timezone: String,
    pub zip: String,
    pub zones: Vec<ZoneConfig>,
    pub rain_delay: RainDelayState,
}

impl DeviceState {
    pub fn enabled_zones(&self) -> impl Iterator<Item = &ZoneConfig> {
        self.zones.iter().filter(|z| z.enabled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStartCommand {
    pub zone_id: String,
    pub zone_number: u32,
    pub name: String,
    pub duration_seconds: u32,
}

impl ZoneStartCommand {
    pub fn duration_minutes(&self) -> u32 {
        self.duration_seconds / 60
    }
}
